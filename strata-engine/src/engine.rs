//! Partition listing over the projected combinatorial space.

use crate::generators::generator_for;
use crate::restrictor::restrict_all;
use crate::{EvaluationContext, ValueSequence};
use std::collections::BTreeMap;
use strata_core::{
    make_partition_name, ColumnFilter, PartitionFilter, ProjectionConfig, ProjectionError,
    ProjectionSpec, SpecError, StrataError, StrataResult,
};
use tracing::debug;

/// Projection engine for one table.
///
/// Immutable and free of shared state; one instance may serve any number of
/// concurrent requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionProjection {
    spec: ProjectionSpec,
    max_partitions: u64,
}

impl PartitionProjection {
    pub fn new(spec: ProjectionSpec, config: &ProjectionConfig) -> Self {
        Self {
            spec,
            max_partitions: config.max_partitions,
        }
    }

    pub fn spec(&self) -> &ProjectionSpec {
        &self.spec
    }

    pub fn max_partitions(&self) -> u64 {
        self.max_partitions
    }

    /// List the partition names matching `filter`.
    ///
    /// `columns` are the table's partition columns in declaration order and
    /// must equal the projected columns.
    pub fn list_partition_names(
        &self,
        columns: &[String],
        filter: &PartitionFilter,
        ctx: &EvaluationContext,
    ) -> StrataResult<Vec<String>> {
        let projected = self.spec.column_names();
        if columns != projected.as_slice() {
            return Err(StrataError::Spec(SpecError::ColumnMismatch {
                expected: columns.to_vec(),
                actual: projected,
            }));
        }
        self.list_filtered(&restrict_all(&self.spec, filter), ctx)
    }

    /// List partition names under already restricted column filters.
    ///
    /// Columns missing from `filters` are unconstrained. Names come out in
    /// column-major order: the first declared column varies slowest.
    pub fn list_filtered(
        &self,
        filters: &BTreeMap<String, ColumnFilter>,
        ctx: &EvaluationContext,
    ) -> StrataResult<Vec<String>> {
        let columns = self.spec.columns();
        let mut sequences: Vec<ValueSequence> = Vec::with_capacity(columns.len());
        for column in columns {
            let filter = filters
                .get(&column.name)
                .unwrap_or(&ColumnFilter::Unconstrained);
            let sequence = generator_for(column).restricted(filter, ctx)?;
            debug!(
                column = %column.name,
                values = sequence.len(),
                "Restricted projected column"
            );
            sequences.push(sequence);
        }

        if sequences.iter().any(ValueSequence::is_empty) {
            return Ok(Vec::new());
        }

        let requested = sequences
            .iter()
            .fold(1u128, |acc, s| acc.saturating_mul(u128::from(s.len())));
        if requested > u128::from(self.max_partitions) {
            return Err(StrataError::Projection(
                ProjectionError::PartitionLimitExceeded {
                    limit: self.max_partitions,
                    requested,
                },
            ));
        }

        // every sequence is no longer than the bounded product
        let rendered: Vec<Vec<String>> = sequences.iter().map(ValueSequence::to_vec).collect();
        let names = Odometer::new(&rendered)
            .map(|tuple| {
                let pairs: Vec<(&str, &str)> = columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .zip(tuple)
                    .collect();
                make_partition_name(&pairs)
            })
            .collect::<Vec<_>>();
        debug!(partitions = names.len(), "Projected partition names");
        Ok(names)
    }
}

/// Cartesian product iterator; the last column varies fastest.
struct Odometer<'a> {
    columns: &'a [Vec<String>],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Odometer<'a> {
    fn new(columns: &'a [Vec<String>]) -> Self {
        Self {
            columns,
            indices: vec![0; columns.len()],
            done: columns.iter().any(Vec::is_empty),
        }
    }
}

impl<'a> Iterator for Odometer<'a> {
    type Item = Vec<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let tuple = self
            .indices
            .iter()
            .zip(self.columns)
            .map(|(&i, values)| values[i].as_str())
            .collect();

        self.done = true;
        for (index, values) in self.indices.iter_mut().zip(self.columns).rev() {
            *index += 1;
            if *index < values.len() {
                self.done = false;
                break;
            }
            *index = 0;
        }
        Some(tuple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{ColumnProjection, ColumnType, IntegerRange, Predicate, ProjectedColumn};

    fn enum_column(name: &str, values: &[&str]) -> ProjectedColumn {
        ProjectedColumn::new(
            name,
            ColumnType::Varchar,
            ColumnProjection::Enum {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    fn engine(columns: Vec<ProjectedColumn>, max: u64) -> PartitionProjection {
        let spec = ProjectionSpec::new(columns, None).unwrap();
        PartitionProjection::new(spec, &ProjectionConfig::default().with_max_partitions(max))
    }

    fn names(engine: &PartitionProjection, filter: &PartitionFilter) -> StrataResult<Vec<String>> {
        let columns = engine.spec().column_names();
        engine.list_partition_names(&columns, filter, &EvaluationContext::new())
    }

    #[test]
    fn test_odometer_order() {
        let columns = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string(), "3".to_string()],
        ];
        let tuples: Vec<Vec<&str>> = Odometer::new(&columns).collect();
        assert_eq!(
            tuples,
            vec![
                vec!["a", "1"],
                vec!["a", "2"],
                vec!["a", "3"],
                vec!["b", "1"],
                vec!["b", "2"],
                vec!["b", "3"],
            ]
        );
    }

    #[test]
    fn test_odometer_without_columns_yields_one_tuple() {
        let columns: Vec<Vec<String>> = Vec::new();
        let tuples: Vec<Vec<&str>> = Odometer::new(&columns).collect();
        assert_eq!(tuples, vec![Vec::<&str>::new()]);
    }

    #[test]
    fn test_single_enum_in_declared_order() {
        let engine = engine(vec![enum_column("col", &["a", "b", "c"])], 100);
        assert_eq!(
            names(&engine, &PartitionFilter::all()).unwrap(),
            vec!["col=a", "col=b", "col=c"]
        );
    }

    #[test]
    fn test_zero_columns_give_one_empty_name() {
        let engine = engine(Vec::new(), 100);
        assert_eq!(names(&engine, &PartitionFilter::all()).unwrap(), vec![""]);
    }

    #[test]
    fn test_limit_checked_before_enumeration() {
        let huge = ProjectedColumn::new(
            "n",
            ColumnType::BigInt,
            ColumnProjection::IntegerRange(IntegerRange::new(0, i64::MAX)),
        );
        let engine = engine(vec![huge.clone(), huge_named(&huge, "m")], 1_000);
        match names(&engine, &PartitionFilter::all()) {
            Err(StrataError::Projection(ProjectionError::PartitionLimitExceeded {
                limit,
                requested,
            })) => {
                assert_eq!(limit, 1_000);
                assert_eq!(requested, (1u128 << 63) * (1u128 << 63));
            }
            other => panic!("Expected PartitionLimitExceeded, got: {:?}", other),
        }
    }

    fn huge_named(column: &ProjectedColumn, name: &str) -> ProjectedColumn {
        let mut renamed = column.clone();
        renamed.name = name.to_string();
        renamed
    }

    #[test]
    fn test_filter_narrows_before_limit() {
        let huge = ProjectedColumn::new(
            "n",
            ColumnType::BigInt,
            ColumnProjection::IntegerRange(IntegerRange::new(0, i64::MAX)),
        );
        let engine = engine(vec![huge], 10);
        let filter = PartitionFilter::all().with("n", Predicate::between(5i64, 7i64));
        assert_eq!(names(&engine, &filter).unwrap(), vec!["n=5", "n=6", "n=7"]);
    }

    #[test]
    fn test_column_mismatch() {
        let engine = engine(vec![enum_column("col", &["a"])], 10);
        let result = engine.list_partition_names(
            &["other".to_string()],
            &PartitionFilter::all(),
            &EvaluationContext::new(),
        );
        match result {
            Err(StrataError::Spec(SpecError::ColumnMismatch { expected, actual })) => {
                assert_eq!(expected, vec!["other".to_string()]);
                assert_eq!(actual, vec!["col".to_string()]);
            }
            other => panic!("Expected column mismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_escaped_values() {
        let engine = engine(vec![enum_column("path", &["a/b", "c=d"])], 10);
        assert_eq!(
            names(&engine, &PartitionFilter::all()).unwrap(),
            vec!["path=a%2Fb", "path=c%3Dd"]
        );
    }
}
