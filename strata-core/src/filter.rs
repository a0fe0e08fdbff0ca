//! Per-column restriction algebra applied to value generators.

use crate::predicate::range_contains;
use crate::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Bound;

/// Restriction on one partition column derived from a query predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnFilter {
    /// No restriction.
    Unconstrained,
    /// Exactly one value.
    Equals(Value),
    /// Values between the bounds.
    Range { low: Bound<Value>, high: Bound<Value> },
    /// Any of the listed values.
    Set(Vec<Value>),
    /// Unsatisfiable: no value qualifies.
    None,
}

impl ColumnFilter {
    /// Inclusive range `[low, high]`.
    pub fn range(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        ColumnFilter::Range {
            low: Bound::Included(low.into()),
            high: Bound::Included(high.into()),
        }
    }

    /// Build a set filter, collapsing the degenerate sizes.
    ///
    /// Duplicates are removed, keeping first occurrence order. An empty set
    /// is unsatisfiable and a single member becomes `Equals`.
    pub fn set<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for value in values {
            let value = value.into();
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        match unique.len() {
            0 => ColumnFilter::None,
            1 => ColumnFilter::Equals(unique.remove(0)),
            _ => ColumnFilter::Set(unique),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, ColumnFilter::Unconstrained)
    }

    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, ColumnFilter::None)
    }

    /// Whether `value` satisfies the filter; `None` when undecidable.
    pub fn admits(&self, value: &Value) -> Option<bool> {
        match self {
            ColumnFilter::Unconstrained => Some(true),
            ColumnFilter::None => Some(false),
            ColumnFilter::Equals(v) => value.compare(v).map(|o| o == Ordering::Equal),
            ColumnFilter::Set(vs) => {
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
            ColumnFilter::Range { low, high } => range_contains(low, high, value),
        }
    }

    /// Conjunction of two filters.
    ///
    /// Where comparability cannot be decided the result keeps the wider
    /// side, so the intersection never drops a qualifying value.
    pub fn intersect(self, other: ColumnFilter) -> ColumnFilter {
        use ColumnFilter as F;
        match (self, other) {
            (F::None, _) | (_, F::None) => F::None,
            (F::Unconstrained, f) | (f, F::Unconstrained) => f,
            (F::Equals(a), other) | (other, F::Equals(a)) => match other.admits(&a) {
                Some(false) => F::None,
                _ => F::Equals(a),
            },
            (F::Set(a), other) | (other, F::Set(a)) => {
                F::set(a.into_iter().filter(|v| other.admits(v) != Some(false)))
            }
            (
                F::Range {
                    low: low_a,
                    high: high_a,
                },
                F::Range {
                    low: low_b,
                    high: high_b,
                },
            ) => {
                let low = tighter_low(low_a, low_b);
                let high = tighter_high(high_a, high_b);
                if bounds_are_empty(&low, &high) {
                    F::None
                } else {
                    F::Range { low, high }
                }
            }
        }
    }

    /// Disjunction of two filters, widened to `Unconstrained` when the
    /// result is not expressible.
    pub fn union(self, other: ColumnFilter) -> ColumnFilter {
        use ColumnFilter as F;
        match (self, other) {
            (F::None, f) | (f, F::None) => f,
            (F::Unconstrained, _) | (_, F::Unconstrained) => F::Unconstrained,
            (
                F::Range {
                    low: low_a,
                    high: high_a,
                },
                F::Range {
                    low: low_b,
                    high: high_b,
                },
            ) => F::Range {
                low: looser_low(low_a, low_b),
                high: looser_high(high_a, high_b),
            },
            (F::Range { .. }, _) | (_, F::Range { .. }) => F::Unconstrained,
            (a, b) => F::set(a.into_values().into_iter().chain(b.into_values())),
        }
    }

    /// Members of an `Equals` or `Set`; empty for every other shape.
    fn into_values(self) -> Vec<Value> {
        match self {
            ColumnFilter::Equals(v) => vec![v],
            ColumnFilter::Set(vs) => vs,
            _ => Vec::new(),
        }
    }
}

fn bound_value(bound: &Bound<Value>) -> Option<&Value> {
    match bound {
        Bound::Included(v) | Bound::Excluded(v) => Some(v),
        Bound::Unbounded => None,
    }
}

/// Picks the larger lower bound; exclusive wins a tie.
fn tighter_low(a: Bound<Value>, b: Bound<Value>) -> Bound<Value> {
    let ordering = match (bound_value(&a), bound_value(&b)) {
        (None, _) => return b,
        (_, None) => return a,
        (Some(x), Some(y)) => x.compare(y),
    };
    match ordering {
        Some(Ordering::Less) => b,
        Some(Ordering::Equal) if matches!(b, Bound::Excluded(_)) => b,
        _ => a,
    }
}

/// Picks the smaller upper bound; exclusive wins a tie.
fn tighter_high(a: Bound<Value>, b: Bound<Value>) -> Bound<Value> {
    let ordering = match (bound_value(&a), bound_value(&b)) {
        (None, _) => return b,
        (_, None) => return a,
        (Some(x), Some(y)) => x.compare(y),
    };
    match ordering {
        Some(Ordering::Greater) => b,
        Some(Ordering::Equal) if matches!(b, Bound::Excluded(_)) => b,
        _ => a,
    }
}

fn looser_low(a: Bound<Value>, b: Bound<Value>) -> Bound<Value> {
    let ordering = match (bound_value(&a), bound_value(&b)) {
        (None, _) | (_, None) => return Bound::Unbounded,
        (Some(x), Some(y)) => x.compare(y),
    };
    match ordering {
        Some(Ordering::Greater) => b,
        Some(Ordering::Equal) if matches!(b, Bound::Included(_)) => b,
        Some(_) => a,
        None => Bound::Unbounded,
    }
}

fn looser_high(a: Bound<Value>, b: Bound<Value>) -> Bound<Value> {
    let ordering = match (bound_value(&a), bound_value(&b)) {
        (None, _) | (_, None) => return Bound::Unbounded,
        (Some(x), Some(y)) => x.compare(y),
    };
    match ordering {
        Some(Ordering::Less) => b,
        Some(Ordering::Equal) if matches!(b, Bound::Included(_)) => b,
        Some(_) => a,
        None => Bound::Unbounded,
    }
}

fn bounds_are_empty(low: &Bound<Value>, high: &Bound<Value>) -> bool {
    let (Some(l), Some(h)) = (bound_value(low), bound_value(high)) else {
        return false;
    };
    match l.compare(h) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => {
            matches!(low, Bound::Excluded(_)) || matches!(high, Bound::Excluded(_))
        }
        _ => false,
    }
}

// =============================================================================
// TESTS
// =============================================================================
