//! Query predicates as pushed down by the planner.
//!
//! This is the external representation; the restrictor in `strata-engine`
//! turns it into a [`ColumnFilter`](crate::ColumnFilter) per column.

use crate::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;

/// A predicate over a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    Eq(Value),
    In(Vec<Value>),
    Range { low: Bound<Value>, high: Bound<Value> },
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    IsNull,
    IsNotNull,
}

impl Predicate {
    /// Inclusive range `[low, high]`.
    pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Predicate::Range {
            low: Bound::Included(low.into()),
            high: Bound::Included(high.into()),
        }
    }

    pub fn eq(value: impl Into<Value>) -> Self {
        Predicate::Eq(value.into())
    }

    pub fn in_list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In(values.into_iter().map(Into::into).collect())
    }

    /// Three-valued evaluation against a (possibly null) value.
    ///
    /// `None` means the outcome is unknown, e.g. the predicate compares
    /// against a value of an incomparable type. Callers that prune must
    /// treat unknown as a match.
    pub fn evaluate(&self, value: Option<&Value>) -> Option<bool> {
        match self {
            Predicate::IsNull => Some(value.is_none()),
            Predicate::IsNotNull => Some(value.is_some()),
            Predicate::Not(inner) => inner.evaluate(value).map(|b| !b),
            Predicate::And(children) => {
                let mut outcome = Some(true);
                for child in children {
                    match child.evaluate(value) {
                        Some(false) => return Some(false),
                        None => outcome = None,
                        Some(true) => {}
                    }
                }
                outcome
            }
            Predicate::Or(children) => {
                let mut outcome = Some(false);
                for child in children {
                    match child.evaluate(value) {
                        Some(true) => return Some(true),
                        None => outcome = None,
                        Some(false) => {}
                    }
                }
                outcome
            }
            _ => {
                // comparisons against null are never true
                let Some(value) = value else {
                    return Some(false);
                };
                match self {
                    Predicate::Eq(v) => value.compare(v).map(|o| o == Ordering::Equal),
                    Predicate::In(vs) => {
                        let mut outcome = Some(false);
                        for v in vs {
                            match value.compare(v) {
                                Some(Ordering::Equal) => return Some(true),
                                None => outcome = None,
                                Some(_) => {}
                            }
                        }
                        outcome
                    }
                    Predicate::Range { low, high } => range_contains(low, high, value),
                    Predicate::Gt(v) => value.compare(v).map(|o| o == Ordering::Greater),
                    Predicate::Gte(v) => value.compare(v).map(|o| o != Ordering::Less),
                    Predicate::Lt(v) => value.compare(v).map(|o| o == Ordering::Less),
                    Predicate::Lte(v) => value.compare(v).map(|o| o != Ordering::Greater),
                    _ => None,
                }
            }
        }
    }
}

/// Whether `value` lies within the bounds. `None` if a bound is incomparable.
pub fn range_contains(low: &Bound<Value>, high: &Bound<Value>, value: &Value) -> Option<bool> {
    let above_low = match low {
        Bound::Unbounded => true,
        Bound::Included(l) => value.compare(l)? != Ordering::Less,
        Bound::Excluded(l) => value.compare(l)? == Ordering::Greater,
    };
    let below_high = match high {
        Bound::Unbounded => true,
        Bound::Included(h) => value.compare(h)? != Ordering::Greater,
        Bound::Excluded(h) => value.compare(h)? == Ordering::Less,
    };
    Some(above_low && below_high)
}

/// Per-column predicates for one table scan. Columns without an entry are
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionFilter {
    predicates: BTreeMap<String, Predicate>,
}

impl PartitionFilter {
    /// A filter that constrains nothing.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a predicate; a second predicate on the same column is AND-ed.
    pub fn with(mut self, column: impl Into<String>, predicate: Predicate) -> Self {
        let column = column.into();
        let combined = match self.predicates.remove(&column) {
            Some(Predicate::And(mut existing)) => {
                existing.push(predicate);
                Predicate::And(existing)
            }
            Some(existing) => Predicate::And(vec![existing, predicate]),
            None => predicate,
        };
        self.predicates.insert(column, combined);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Predicate> {
        self.predicates.get(column)
    }

    pub fn is_all(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Predicate)> {
        self.predicates.iter()
    }
}
