//! Partition materialization from partition names.

use crate::generators::generator_for;
use crate::{EvaluationContext, PartitionProjection};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use strata_core::{
    parse_partition_name, MaterializationError, Partition, StrataError, StrataResult, Table,
};
use tracing::warn;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}]*)\}")
        .unwrap_or_else(|e| panic!("placeholder regex is invalid: {}", e))
});

impl PartitionProjection {
    /// Rebuild the partition named `name` of `table`.
    ///
    /// The name must carry exactly the projected columns, in order, and every
    /// value must belong to its column's projected domain.
    pub fn materialize(
        &self,
        table: &Table,
        name: &str,
        ctx: &EvaluationContext,
    ) -> StrataResult<Partition> {
        let invalid = |reason: String| {
            StrataError::Materialization(MaterializationError::InvalidPartitionName {
                name: name.to_string(),
                reason,
            })
        };

        let values = parse_partition_name(name).map_err(invalid)?;
        let columns = self.spec().columns();
        let identities_match = values.len() == columns.len()
            && values
                .iter()
                .zip(columns)
                .all(|((key, _), column)| *key == column.name);
        if !identities_match {
            return Err(invalid(format!(
                "expected columns {:?}",
                self.spec().column_names()
            )));
        }

        for ((_, raw), column) in values.iter().zip(columns) {
            if let Err(reason) = generator_for(column).check(raw, ctx) {
                warn!(
                    table = %table.qualified_name(),
                    column = %column.name,
                    value = %raw,
                    "Rejected partition value"
                );
                return Err(StrataError::Materialization(
                    MaterializationError::PartitionValueOutOfDomain {
                        column: column.name.clone(),
                        value: raw.clone(),
                        reason,
                    },
                ));
            }
        }

        let location = match self.spec().location_template() {
            Some(template) => substitute(template, &values)?,
            None => default_location(&table.storage_location, name),
        };

        Ok(Partition {
            database_name: table.database_name.clone(),
            table_name: table.table_name.clone(),
            values,
            name: name.to_string(),
            location,
        })
    }
}

/// Replace every `${column}` in `template` with that column's value.
pub fn substitute(template: &str, values: &[(String, String)]) -> StrataResult<String> {
    let mut unresolved = None;
    let location = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        let column = caps.get(1).map_or("", |m| m.as_str());
        match values.iter().find(|(c, _)| c == column) {
            Some((_, value)) => value.clone(),
            None => {
                unresolved.get_or_insert_with(|| caps[0].to_string());
                String::new()
            }
        }
    });
    match unresolved {
        Some(placeholder) => Err(StrataError::Materialization(
            MaterializationError::UnresolvedTemplate {
                placeholder,
                template: template.to_string(),
            },
        )),
        None => Ok(location.into_owned()),
    }
}

/// Table base location joined with the partition name.
pub fn default_location(base: &str, name: &str) -> String {
    if name.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), name)
    }
}
