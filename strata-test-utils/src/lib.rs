//! strata Test Utilities
//!
//! Shared test infrastructure for the strata workspace:
//! - Proptest generators for projection specs and their parts
//! - Fixtures for common tables and specs
//! - Custom assertions for strata errors

pub use strata_core::{
    ColumnFilter, ColumnProjection, ColumnType, ConfigError, DateBound, DateInterval,
    DatePattern, DateRange, IntegerRange, IntervalUnit, MaterializationError, MetastoreError,
    PartitionFilter, Predicate, ProjectedColumn, ProjectionConfig, ProjectionError,
    ProjectionSpec, SpecError, StrataError, StrataResult, Table, Value, LOCATION_TEMPLATE,
    PROJECTION_ENABLED,
};

use chrono::{NaiveDate, NaiveDateTime};

/// Midnight on the given day. Invalid dates fall back to the epoch.
pub fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating strata projection types.

    use super::*;
    use proptest::prelude::*;

    /// A raw partition value, including characters the name codec escapes.
    pub fn arb_raw_value() -> impl Strategy<Value = String> {
        "[a-z0-9/=%:#? -]{1,8}"
    }

    /// Distinct, non-empty enum values.
    pub fn arb_enum_values() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set(arb_raw_value(), 1..5)
            .prop_map(|values| values.into_iter().collect())
    }

    /// A well-formed integer range with a small value count.
    pub fn arb_integer_range() -> impl Strategy<Value = IntegerRange> {
        (-500i64..500, 0i64..40, 1i64..7, prop::option::of(1u32..5)).prop_map(
            |(min, span, step, digits)| {
                let range = IntegerRange::new(min, min + span).with_step(step);
                match digits {
                    Some(digits) => range.with_digits(digits),
                    None => range,
                }
            },
        )
    }

    /// A calendar unit together with a pattern rendering it.
    pub fn arb_date_grid() -> impl Strategy<Value = (IntervalUnit, DatePattern)> {
        prop_oneof![
            Just((IntervalUnit::Days, "yyyy-MM-dd")),
            Just((IntervalUnit::Months, "yyyy-MM")),
            Just((IntervalUnit::Hours, "yyyy/MM/dd/HH")),
            Just((IntervalUnit::Years, "yyyy")),
        ]
        .prop_filter_map("pattern compiles", |(unit, pattern)| {
            DatePattern::compile(pattern).ok().map(|p| (unit, p))
        })
    }

    /// A well-formed date range with fixed bounds.
    pub fn arb_date_range() -> impl Strategy<Value = DateRange> {
        (arb_date_grid(), 2000i32..2030, 1u32..13, 1u32..4, 0u64..20).prop_filter_map(
            "bounds representable",
            |((unit, pattern), year, month, magnitude, steps)| {
                let start = pattern.truncate(midnight(year, month, 1))?;
                let interval = DateInterval::new(magnitude, unit);
                let end = interval.advance(start, steps)?;
                Some(DateRange {
                    min: DateBound::Fixed(start),
                    max: DateBound::Fixed(end),
                    interval,
                    pattern,
                })
            },
        )
    }

    /// Any generated projection kind.
    pub fn arb_column_projection() -> impl Strategy<Value = ColumnProjection> {
        prop_oneof![
            arb_enum_values().prop_map(|values| ColumnProjection::Enum { values }),
            arb_integer_range().prop_map(ColumnProjection::IntegerRange),
            arb_date_range().prop_map(ColumnProjection::DateRange),
        ]
    }

    /// A spec of up to three generated columns named `c0`, `c1`, ...
    pub fn arb_projection_spec() -> impl Strategy<Value = ProjectionSpec> {
        prop::collection::vec(arb_column_projection(), 0..4).prop_filter_map(
            "spec is valid",
            |projections| {
                let columns = projections
                    .into_iter()
                    .enumerate()
                    .map(|(i, projection)| {
                        ProjectedColumn::new(format!("c{}", i), ColumnType::Varchar, projection)
                    })
                    .collect();
                ProjectionSpec::new(columns, None).ok()
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built tables and specs for common testing scenarios.

    use super::*;

    /// A plain, unprojected table partitioned by `region` and `dt`.
    pub fn plain_table() -> Table {
        Table::new("web", "logs", "s3://bucket/logs")
            .with_data_column("message", ColumnType::Varchar)
            .with_partition_column("region", ColumnType::Varchar)
            .with_partition_column("dt", ColumnType::Varchar)
    }

    /// A projected table: enum `region`, padded integer `id`, daily `dt`.
    pub fn projected_table() -> Table {
        Table::new("web", "events", "s3://bucket/events")
            .with_data_column("payload", ColumnType::Varchar)
            .with_partition_column("region", ColumnType::Varchar)
            .with_partition_column("id", ColumnType::Integer)
            .with_partition_column("dt", ColumnType::Varchar)
            .with_parameter(PROJECTION_ENABLED, "true")
            .with_parameter("projection.region.type", "enum")
            .with_parameter("projection.region.values", "us-east,eu-west,ap-south")
            .with_parameter("projection.id.type", "integer")
            .with_parameter("projection.id.range", "0,10")
            .with_parameter("projection.id.interval", "2")
            .with_parameter("projection.id.digits", "2")
            .with_parameter("projection.dt.type", "date")
            .with_parameter("projection.dt.format", "yyyy-MM-dd")
            .with_parameter("projection.dt.range", "2020-01-01,2020-01-03")
    }

    /// A projected table whose only partition column is injected.
    pub fn injected_table() -> Table {
        Table::new("web", "tenants", "s3://bucket/tenants")
            .with_partition_column("tenant", ColumnType::Varchar)
            .with_parameter(PROJECTION_ENABLED, "true")
            .with_parameter("projection.tenant.type", "injected")
            .with_parameter(LOCATION_TEMPLATE, "s3://bucket/tenants/${tenant}/")
    }

    /// Single enum column `col` over `values`.
    pub fn enum_spec(values: &[&str]) -> ProjectionSpec {
        spec(vec![enum_column("col", values)])
    }

    pub fn enum_column(name: &str, values: &[&str]) -> ProjectedColumn {
        ProjectedColumn::new(
            name,
            ColumnType::Varchar,
            ColumnProjection::Enum {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    pub fn integer_column(name: &str, range: IntegerRange) -> ProjectedColumn {
        ProjectedColumn::new(name, ColumnType::Integer, ColumnProjection::IntegerRange(range))
    }

    /// Daily `yyyy-MM-dd` column between two fixed days.
    pub fn daily_column(name: &str, min: NaiveDateTime, max: NaiveDateTime) -> ProjectedColumn {
        ProjectedColumn::new(
            name,
            ColumnType::Varchar,
            ColumnProjection::DateRange(DateRange {
                min: DateBound::Fixed(min),
                max: DateBound::Fixed(max),
                interval: DateInterval::new(1, IntervalUnit::Days),
                pattern: daily_pattern(),
            }),
        )
    }

    pub fn injected_column(name: &str) -> ProjectedColumn {
        ProjectedColumn::new(name, ColumnType::Varchar, ColumnProjection::Injected)
    }

    /// Build a spec without a location template.
    ///
    /// Panics on an invalid column set; fixtures are expected to be valid.
    pub fn spec(columns: Vec<ProjectedColumn>) -> ProjectionSpec {
        ProjectionSpec::new(columns, None)
            .unwrap_or_else(|e| panic!("fixture spec is invalid: {}", e))
    }

    pub fn daily_pattern() -> DatePattern {
        DatePattern::compile("yyyy-MM-dd")
            .unwrap_or_else(|e| panic!("fixture pattern is invalid: {}", e))
    }

    /// A table whose partition columns mirror `spec`.
    pub fn table_for(spec: &ProjectionSpec) -> Table {
        spec.columns().iter().fold(
            Table::new("test", "projected", "s3://bucket/projected/"),
            |table, column| table.with_partition_column(column.name.clone(), column.column_type),
        )
    }

    /// Config with the given partition limit.
    pub fn config_with_limit(max_partitions: u64) -> ProjectionConfig {
        ProjectionConfig::default().with_max_partitions(max_partitions)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for strata-specific errors.

    use super::*;

    /// Assert that a StrataResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &StrataResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a StrataResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &StrataResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    #[track_caller]
    pub fn assert_injected_unbound<T: std::fmt::Debug>(result: &StrataResult<T>, column: &str) {
        match result {
            Err(StrataError::Projection(ProjectionError::InjectedColumnUnbound { column: c })) => {
                assert_eq!(c, column, "Wrong column in InjectedColumnUnbound");
            }
            other => panic!("Expected InjectedColumnUnbound({}), got: {:?}", column, other),
        }
    }

    /// Assert a PartitionLimitExceeded error with the given limit.
    #[track_caller]
    pub fn assert_limit_exceeded<T: std::fmt::Debug>(result: &StrataResult<T>, limit: u64) {
        match result {
            Err(StrataError::Projection(ProjectionError::PartitionLimitExceeded {
                limit: l,
                requested,
            })) => {
                assert_eq!(*l, limit, "Wrong limit in PartitionLimitExceeded");
                assert!(
                    *requested > u128::from(limit),
                    "Requested {} does not exceed limit {}",
                    requested,
                    limit
                );
            }
            other => panic!("Expected PartitionLimitExceeded({}), got: {:?}", limit, other),
        }
    }

    #[track_caller]
    pub fn assert_table_not_found<T: std::fmt::Debug>(
        result: &StrataResult<T>,
        database: &str,
        table: &str,
    ) {
        match result {
            Err(StrataError::Metastore(MetastoreError::TableNotFound {
                database: d,
                table: t,
            })) => {
                assert_eq!(d, database, "Wrong database in TableNotFound");
                assert_eq!(t, table, "Wrong table in TableNotFound");
            }
            other => panic!(
                "Expected TableNotFound({}.{}), got: {:?}",
                database, table, other
            ),
        }
    }

    #[track_caller]
    pub fn assert_invalid_partition_name<T: std::fmt::Debug>(result: &StrataResult<T>) {
        match result {
            Err(StrataError::Materialization(MaterializationError::InvalidPartitionName {
                ..
            })) => {}
            other => panic!("Expected InvalidPartitionName, got: {:?}", other),
        }
    }

    /// Assert a PartitionValueOutOfDomain error naming `column`.
    #[track_caller]
    pub fn assert_out_of_domain<T: std::fmt::Debug>(result: &StrataResult<T>, column: &str) {
        match result {
            Err(StrataError::Materialization(
                MaterializationError::PartitionValueOutOfDomain { column: c, .. },
            )) => {
                assert_eq!(c, column, "Wrong column in PartitionValueOutOfDomain");
            }
            other => panic!("Expected PartitionValueOutOfDomain({}), got: {:?}", column, other),
        }
    }

    #[track_caller]
    pub fn assert_unresolved_template<T: std::fmt::Debug>(
        result: &StrataResult<T>,
        placeholder: &str,
    ) {
        match result {
            Err(StrataError::Materialization(MaterializationError::UnresolvedTemplate {
                placeholder: p,
                ..
            })) => {
                assert_eq!(p, placeholder, "Wrong placeholder in UnresolvedTemplate");
            }
            other => panic!("Expected UnresolvedTemplate({}), got: {:?}", placeholder, other),
        }
    }

    #[track_caller]
    pub fn assert_spec_error<T: std::fmt::Debug>(result: &StrataResult<T>) {
        match result {
            Err(StrataError::Spec(_)) => {}
            other => panic!("Expected Spec error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &StrataResult<T>) {
        match result {
            Err(StrataError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_projected_table_fixture_parses() {
        let table = fixtures::projected_table();
        let spec = ProjectionSpec::from_table(&table).unwrap().unwrap();
        assert_eq!(spec.column_names(), table.partition_column_names());
    }

    #[test]
    fn test_injected_table_fixture_parses() {
        let spec = ProjectionSpec::from_table(&fixtures::injected_table())
            .unwrap()
            .unwrap();
        assert_eq!(spec.columns()[0].projection, ColumnProjection::Injected);
        assert_eq!(spec.location_template(), Some("s3://bucket/tenants/${tenant}/"));
    }

    #[test]
    fn test_plain_table_is_not_projected() {
        assert!(ProjectionSpec::from_table(&fixtures::plain_table())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_table_for_mirrors_spec() {
        let spec = fixtures::spec(vec![
            fixtures::enum_column("a", &["x"]),
            fixtures::injected_column("b"),
        ]);
        let table = fixtures::table_for(&spec);
        assert!(spec.check_columns(&table).is_ok());
    }

    #[test]
    fn test_assertion_injected_unbound() {
        let result: StrataResult<()> = Err(StrataError::Projection(
            ProjectionError::InjectedColumnUnbound {
                column: "region".to_string(),
            },
        ));
        assertions::assert_injected_unbound(&result, "region");
    }

    #[test]
    fn test_assertion_limit_exceeded() {
        let result: StrataResult<()> = Err(StrataError::Projection(
            ProjectionError::PartitionLimitExceeded {
                limit: 5,
                requested: 9,
            },
        ));
        assertions::assert_limit_exceeded(&result, 5);
    }

    #[test]
    fn test_assertion_table_not_found() {
        let result: StrataResult<()> = Err(StrataError::Metastore(MetastoreError::TableNotFound {
            database: "db".to_string(),
            table: "t".to_string(),
        }));
        assertions::assert_table_not_found(&result, "db", "t");
    }

    #[test]
    #[should_panic(expected = "Expected Spec error")]
    fn test_assertion_reports_wrong_variant() {
        let result: StrataResult<()> = Ok(());
        assertions::assert_spec_error(&result);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_specs_are_valid(spec in generators::arb_projection_spec()) {
            let table = fixtures::table_for(&spec);
            prop_assert!(spec.check_columns(&table).is_ok());
            prop_assert!(spec.columns().len() < 4);
        }

        #[test]
        fn prop_generated_date_ranges_are_ordered(range in generators::arb_date_range()) {
            match (range.min, range.max) {
                (DateBound::Fixed(min), DateBound::Fixed(max)) => prop_assert!(min <= max),
                other => prop_assert!(false, "unexpected bounds {:?}", other),
            }
        }

        #[test]
        fn prop_generated_integer_ranges_are_well_formed(range in generators::arb_integer_range()) {
            prop_assert!(range.min <= range.max);
            prop_assert!(range.step > 0);
        }
    }
}
