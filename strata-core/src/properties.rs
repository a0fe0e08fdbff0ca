//! Reads a [`ProjectionSpec`] from Athena-style table properties.
//!
//! ```text
//! projection.enabled            = true
//! projection.<col>.type         = enum | integer | date | injected
//! projection.<col>.values       = a,b,c                 (enum)
//! projection.<col>.range        = min,max               (integer, date)
//! projection.<col>.interval     = step                  (integer, date)
//! projection.<col>.interval.unit= DAYS                  (date)
//! projection.<col>.digits       = 2                     (integer)
//! projection.<col>.format       = yyyy-MM-dd            (date)
//! storage.location.template     = s3://bucket/${col}/
//! ```

use crate::{
    Column, ColumnProjection, DateBound, DateInterval, DatePattern, DateRange, IntegerRange,
    IntervalUnit, ProjectedColumn, ProjectionSpec, SpecError, StrataError, StrataResult, Table,
};
use std::collections::{BTreeMap, BTreeSet};

pub const PROJECTION_ENABLED: &str = "projection.enabled";
pub const LOCATION_TEMPLATE: &str = "storage.location.template";

const PREFIX: &str = "projection.";
const TYPE: &str = "type";
const VALUES: &str = "values";
const RANGE: &str = "range";
const INTERVAL: &str = "interval";
const INTERVAL_UNIT: &str = "interval.unit";
const DIGITS: &str = "digits";
const FORMAT: &str = "format";

impl ProjectionSpec {
    /// Parse the projection spec carried by a table's properties.
    ///
    /// Returns `Ok(None)` when projection is not enabled on the table, or
    /// when the projected columns differ from the partition columns (such a
    /// table is treated as not projected). Malformed per-column properties
    /// fail with [`SpecError`].
    pub fn from_table(table: &Table) -> StrataResult<Option<ProjectionSpec>> {
        let enabled = table
            .parameters
            .get(PROJECTION_ENABLED)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        if !enabled {
            return Ok(None);
        }

        let projected = projected_column_names(&table.parameters);
        let expected = table.partition_column_names();
        let mut sorted_expected = expected.clone();
        sorted_expected.sort();
        if projected != sorted_expected {
            tracing::warn!(
                table = %table.qualified_name(),
                partition_columns = ?expected,
                projected_columns = ?projected,
                "projection properties do not cover the partition columns; projection ignored"
            );
            return Ok(None);
        }

        let columns = table
            .partition_columns
            .iter()
            .map(|column| parse_column(column, &table.parameters))
            .collect::<Result<Vec<_>, SpecError>>()?;

        let template = table
            .parameters
            .get(LOCATION_TEMPLATE)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let spec = ProjectionSpec::new(columns, template)?;
        spec.check_columns(table).map_err(StrataError::Spec)?;
        Ok(Some(spec))
    }
}

/// Names of every column with a `projection.<col>.type` key, sorted.
fn projected_column_names(parameters: &BTreeMap<String, String>) -> Vec<String> {
    parameters
        .keys()
        .filter_map(|key| key.strip_prefix(PREFIX)?.strip_suffix(".type"))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

struct ColumnProperties<'a> {
    column: &'a str,
    parameters: &'a BTreeMap<String, String>,
}

impl<'a> ColumnProperties<'a> {
    fn get(&self, property: &str) -> Option<&'a str> {
        self.parameters
            .get(&format!("{}{}.{}", PREFIX, self.column, property))
            .map(|v| v.trim())
    }

    fn require(&self, property: &str) -> Result<&'a str, SpecError> {
        self.get(property).ok_or_else(|| SpecError::MissingProperty {
            column: self.column.to_string(),
            property: format!("{}{}.{}", PREFIX, self.column, property),
        })
    }

    fn invalid(&self, property: &str, value: &str, reason: impl Into<String>) -> SpecError {
        SpecError::InvalidProperty {
            column: self.column.to_string(),
            property: property.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Split `min,max`.
    fn range(&self) -> Result<(&'a str, &'a str), SpecError> {
        let raw = self.require(RANGE)?;
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [min, max] => Ok((*min, *max)),
            _ => Err(self.invalid(RANGE, raw, "expected exactly two comma-separated bounds")),
        }
    }
}

fn parse_column(
    column: &Column,
    parameters: &BTreeMap<String, String>,
) -> Result<ProjectedColumn, SpecError> {
    let props = ColumnProperties {
        column: &column.name,
        parameters,
    };
    let kind = props.require(TYPE)?;
    let projection = match kind.to_ascii_lowercase().as_str() {
        "enum" => parse_enum(&props)?,
        "integer" => parse_integer(&props)?,
        "date" => parse_date(&props)?,
        "injected" => ColumnProjection::Injected,
        _ => {
            return Err(props.invalid(
                TYPE,
                kind,
                "expected one of enum, integer, date, injected",
            ))
        }
    };
    Ok(ProjectedColumn::new(
        column.name.clone(),
        column.column_type,
        projection,
    ))
}

fn parse_enum(props: &ColumnProperties<'_>) -> Result<ColumnProjection, SpecError> {
    let raw = props.require(VALUES)?;
    let values: Vec<String> = raw.split(',').map(|v| v.trim().to_string()).collect();
    if values.iter().any(String::is_empty) {
        return Err(props.invalid(VALUES, raw, "enum values must not be blank"));
    }
    Ok(ColumnProjection::Enum { values })
}

fn parse_integer(props: &ColumnProperties<'_>) -> Result<ColumnProjection, SpecError> {
    let (min, max) = props.range()?;
    let parse_bound = |text: &str| {
        text.parse::<i64>()
            .map_err(|_| props.invalid(RANGE, text, "bound is not an integer"))
    };
    let mut range = IntegerRange::new(parse_bound(min)?, parse_bound(max)?);

    if let Some(step) = props.get(INTERVAL) {
        range.step = step
            .parse()
            .map_err(|_| props.invalid(INTERVAL, step, "interval is not an integer"))?;
    }
    if let Some(digits) = props.get(DIGITS) {
        let width: u32 = digits
            .parse()
            .map_err(|_| props.invalid(DIGITS, digits, "digits is not a non-negative integer"))?;
        range.digits = Some(width);
    }
    Ok(ColumnProjection::IntegerRange(range))
}

fn parse_date(props: &ColumnProperties<'_>) -> Result<ColumnProjection, SpecError> {
    let format = props.require(FORMAT)?;
    let pattern = DatePattern::compile(format).map_err(|reason| props.invalid(FORMAT, format, reason))?;

    let (min, max) = props.range()?;
    let min = DateBound::parse(min, &pattern).map_err(|reason| props.invalid(RANGE, min, reason))?;
    let max = DateBound::parse(max, &pattern).map_err(|reason| props.invalid(RANGE, max, reason))?;

    let magnitude = match props.get(INTERVAL) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| props.invalid(INTERVAL, raw, "interval is not a positive integer"))?,
        None => 1,
    };
    let unit = match props.get(INTERVAL_UNIT) {
        Some(raw) => raw
            .parse::<IntervalUnit>()
            .map_err(|reason| props.invalid(INTERVAL_UNIT, raw, reason))?,
        None => pattern.finest_unit(),
    };

    Ok(ColumnProjection::DateRange(DateRange {
        min,
        max,
        interval: DateInterval::new(magnitude, unit),
        pattern,
    }))
}

// =============================================================================
// TESTS
// =============================================================================
