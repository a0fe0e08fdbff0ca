//! Translation of pushed-down predicates into per-column filters.
//!
//! Translation never narrows incorrectly: any predicate shape without an
//! exact [`ColumnFilter`] counterpart widens to `Unconstrained`. Operands are
//! converted into the column's value domain before filters are combined, so
//! `"9"` and `"10"` order as integers on an integer column.

use std::collections::BTreeMap;
use std::ops::Bound;
use strata_core::{
    range_contains, ColumnFilter, ColumnProjection, DatePattern, PartitionFilter, Predicate,
    ProjectedColumn, ProjectionSpec, Value,
};
use tracing::{debug, warn};

/// Filter for one projected column. A column without a predicate is
/// unconstrained.
pub fn restrict(column: &ProjectedColumn, predicate: Option<&Predicate>) -> ColumnFilter {
    let Some(predicate) = predicate else {
        return ColumnFilter::Unconstrained;
    };
    let domain = Domain::of(&column.projection);
    let filter = translate(&column.name, predicate, &domain);
    match (&column.projection, filter) {
        (ColumnProjection::Enum { values }, ColumnFilter::Range { low, high }) => {
            resolve_enum_range(values, &low, &high)
        }
        (_, filter) => filter,
    }
}

/// Filters for every column of `spec`, keyed by column name.
pub fn restrict_all(
    spec: &ProjectionSpec,
    filter: &PartitionFilter,
) -> BTreeMap<String, ColumnFilter> {
    for (column, _) in filter.iter() {
        if spec.column(column).is_none() {
            debug!(column = %column, "Ignoring predicate on non-partition column");
        }
    }
    spec.columns()
        .iter()
        .map(|column| {
            let restricted = restrict(column, filter.get(&column.name));
            (column.name.clone(), restricted)
        })
        .collect()
}

/// Value domain that filter operands are compared in.
#[derive(Debug, Clone, Copy)]
enum Domain<'a> {
    Integer,
    Date(&'a DatePattern),
    /// Enum and injected columns compare operands as given.
    Text,
}

impl<'a> Domain<'a> {
    fn of(projection: &'a ColumnProjection) -> Self {
        match projection {
            ColumnProjection::IntegerRange(_) => Domain::Integer,
            ColumnProjection::DateRange(range) => Domain::Date(&range.pattern),
            ColumnProjection::Enum { .. } | ColumnProjection::Injected => Domain::Text,
        }
    }

    /// The operand as a value of this domain; `None` when it has no such
    /// reading.
    fn convert(&self, value: &Value) -> Option<Value> {
        match self {
            Domain::Integer => value.as_integer().map(Value::Integer),
            Domain::Date(pattern) => {
                let instant = match value {
                    Value::String(text) => pattern.parse(text),
                    other => other.as_datetime(),
                };
                instant.map(Value::Timestamp)
            }
            Domain::Text => Some(value.clone()),
        }
    }

    /// Unconvertible bounds leave their side open.
    fn bound(&self, bound: &Bound<Value>) -> Bound<Value> {
        let convert = |v: &Value| self.convert(v);
        match bound {
            Bound::Included(v) => convert(v).map_or(Bound::Unbounded, Bound::Included),
            Bound::Excluded(v) => convert(v).map_or(Bound::Unbounded, Bound::Excluded),
            Bound::Unbounded => Bound::Unbounded,
        }
    }

    fn range(&self, low: &Bound<Value>, high: &Bound<Value>) -> ColumnFilter {
        match (self.bound(low), self.bound(high)) {
            (Bound::Unbounded, Bound::Unbounded) => ColumnFilter::Unconstrained,
            (low, high) => ColumnFilter::Range { low, high },
        }
    }
}

// An equality operand outside the domain matches no generated value.
fn translate(column: &str, predicate: &Predicate, domain: &Domain<'_>) -> ColumnFilter {
    match predicate {
        Predicate::Eq(value) => domain
            .convert(value)
            .map_or(ColumnFilter::None, ColumnFilter::Equals),
        Predicate::In(values) => ColumnFilter::set(values.iter().filter_map(|v| domain.convert(v))),
        Predicate::Range { low, high } => domain.range(low, high),
        Predicate::Gt(value) => domain.range(&Bound::Excluded(value.clone()), &Bound::Unbounded),
        Predicate::Gte(value) => domain.range(&Bound::Included(value.clone()), &Bound::Unbounded),
        Predicate::Lt(value) => domain.range(&Bound::Unbounded, &Bound::Excluded(value.clone())),
        Predicate::Lte(value) => domain.range(&Bound::Unbounded, &Bound::Included(value.clone())),
        Predicate::And(children) => children
            .iter()
            .map(|child| translate(column, child, domain))
            .fold(ColumnFilter::Unconstrained, ColumnFilter::intersect),
        // an empty disjunction is false
        Predicate::Or(children) => children
            .iter()
            .map(|child| translate(column, child, domain))
            .fold(ColumnFilter::None, ColumnFilter::union),
        // projected values are never null
        Predicate::IsNull => ColumnFilter::None,
        Predicate::IsNotNull => ColumnFilter::Unconstrained,
        Predicate::Not(_) => {
            warn!(column = %column, "Negated predicate not pushed into projection");
            ColumnFilter::Unconstrained
        }
    }
}

/// Declared enum values that may fall inside the range. Values whose
/// comparison with a bound is undecidable are kept.
fn resolve_enum_range(values: &[String], low: &Bound<Value>, high: &Bound<Value>) -> ColumnFilter {
    ColumnFilter::set(
        values
            .iter()
            .map(|v| Value::String(v.clone()))
            .filter(|v| range_contains(low, high, v) != Some(false)),
    )
}
