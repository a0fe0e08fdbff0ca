//! Declarative projection specification.

use crate::{
    ColumnType, DateBound, DateInterval, DatePattern, SpecError, StrataError, StrataResult, Table,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Integer range projection: `min..=max` stepping by `step`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegerRange {
    pub min: i64,
    pub max: i64,
    pub step: i64,
    /// Zero-pad rendered values to this many digits.
    pub digits: Option<u32>,
}

impl IntegerRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            step: 1,
            digits: None,
        }
    }

    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = Some(digits);
        self
    }

    /// Render a value the way partition names carry it.
    pub fn render(&self, value: i64) -> String {
        match self.digits {
            Some(width) => format!("{:0width$}", value, width = width as usize),
            None => value.to_string(),
        }
    }

    /// Whether `value` is in bounds and on the step grid. A range without
    /// a positive step contains nothing.
    pub fn contains(&self, value: i64) -> bool {
        self.step > 0
            && value >= self.min
            && value <= self.max
            && (i128::from(value) - i128::from(self.min)) % i128::from(self.step) == 0
    }
}

/// Date range projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub min: DateBound,
    pub max: DateBound,
    pub interval: DateInterval,
    pub pattern: DatePattern,
}

/// How values of one partition column are produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnProjection {
    Enum { values: Vec<String> },
    IntegerRange(IntegerRange),
    DateRange(DateRange),
    Injected,
}

impl ColumnProjection {
    /// Short name used in properties and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ColumnProjection::Enum { .. } => "enum",
            ColumnProjection::IntegerRange(_) => "integer",
            ColumnProjection::DateRange(_) => "date",
            ColumnProjection::Injected => "injected",
        }
    }

    /// Whether a column of `column_type` can carry this projection.
    pub fn supports(&self, column_type: ColumnType) -> bool {
        match self {
            ColumnProjection::Enum { .. } | ColumnProjection::Injected => true,
            ColumnProjection::IntegerRange(_) => {
                column_type.is_integral() || column_type == ColumnType::Varchar
            }
            ColumnProjection::DateRange(_) => {
                column_type.is_temporal() || column_type == ColumnType::Varchar
            }
        }
    }

    /// Structural well-formedness of the projection itself.
    fn validate(&self, column: &str) -> Result<(), SpecError> {
        let invalid = |property: &str, value: String, reason: &str| SpecError::InvalidProperty {
            column: column.to_string(),
            property: property.to_string(),
            value,
            reason: reason.to_string(),
        };
        match self {
            ColumnProjection::Enum { values } => {
                if values.is_empty() {
                    return Err(invalid("values", String::new(), "enum values must not be empty"));
                }
                let mut seen = BTreeSet::new();
                for value in values {
                    if value.is_empty() {
                        return Err(invalid("values", values.join(","), "enum values must not be blank"));
                    }
                    if !seen.insert(value) {
                        return Err(invalid("values", value.clone(), "enum values must be unique"));
                    }
                }
            }
            ColumnProjection::IntegerRange(range) => {
                if range.min > range.max {
                    return Err(invalid(
                        "range",
                        format!("{},{}", range.min, range.max),
                        "min must not exceed max",
                    ));
                }
                if range.step <= 0 {
                    return Err(invalid("interval", range.step.to_string(), "step must be positive"));
                }
            }
            ColumnProjection::DateRange(range) => {
                if range.interval.magnitude == 0 {
                    return Err(invalid("interval", "0".to_string(), "interval must be positive"));
                }
                if let (DateBound::Fixed(min), DateBound::Fixed(max)) = (&range.min, &range.max) {
                    if min > max {
                        return Err(invalid(
                            "range",
                            format!("{},{}", range.pattern.format(*min), range.pattern.format(*max)),
                            "min must not exceed max",
                        ));
                    }
                }
            }
            ColumnProjection::Injected => {}
        }
        Ok(())
    }
}

/// One projected partition column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectedColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub projection: ColumnProjection,
}

impl ProjectedColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType, projection: ColumnProjection) -> Self {
        Self {
            name: name.into(),
            column_type,
            projection,
        }
    }
}

/// Projection specification for one table.
///
/// Immutable once built; columns are kept in partition declaration order.
/// Deserialization validates through [`ProjectionSpec::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ProjectionSpecDef")]
pub struct ProjectionSpec {
    columns: Vec<ProjectedColumn>,
    location_template: Option<String>,
}

/// Unvalidated serialized form of a [`ProjectionSpec`].
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionSpecDef {
    pub columns: Vec<ProjectedColumn>,
    #[serde(default)]
    pub location_template: Option<String>,
}

impl TryFrom<ProjectionSpecDef> for ProjectionSpec {
    type Error = StrataError;

    fn try_from(def: ProjectionSpecDef) -> StrataResult<Self> {
        ProjectionSpec::new(def.columns, def.location_template)
    }
}

impl ProjectionSpec {
    /// Build and validate a spec.
    pub fn new(
        columns: Vec<ProjectedColumn>,
        location_template: Option<String>,
    ) -> StrataResult<Self> {
        let mut names = BTreeSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(StrataError::Spec(SpecError::InvalidProperty {
                    column: column.name.clone(),
                    property: "type".to_string(),
                    value: column.projection.kind().to_string(),
                    reason: "column is projected more than once".to_string(),
                }));
            }
            if !column.projection.supports(column.column_type) {
                return Err(StrataError::Spec(SpecError::UnsupportedColumnType {
                    column: column.name.clone(),
                    column_type: column.column_type.to_string(),
                    projection: column.projection.kind().to_string(),
                }));
            }
            column.projection.validate(&column.name)?;
        }

        if let Some(template) = &location_template {
            for column in &columns {
                if !template.contains(&placeholder(&column.name)) {
                    return Err(StrataError::Spec(SpecError::MissingTemplatePlaceholder {
                        template: template.clone(),
                        column: column.name.clone(),
                    }));
                }
            }
        }

        Ok(Self {
            columns,
            location_template,
        })
    }

    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ProjectedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn location_template(&self) -> Option<&str> {
        self.location_template.as_deref()
    }

    /// Check that the projected columns are exactly the table's partition
    /// columns, in the same order.
    pub fn check_columns(&self, table: &Table) -> Result<(), SpecError> {
        let expected = table.partition_column_names();
        let actual = self.column_names();
        if expected != actual {
            return Err(SpecError::ColumnMismatch { expected, actual });
        }
        Ok(())
    }
}

/// `${column}`
pub fn placeholder(column: &str) -> String {
    format!("${{{}}}", column)
}
