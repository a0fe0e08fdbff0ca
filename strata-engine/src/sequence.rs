//! Lazily rendered, ordered value sequences.
//!
//! A sequence knows its length without rendering anything, which lets the
//! engine enforce the partition limit before any enumeration happens.

use chrono::NaiveDateTime;
use strata_core::{DateInterval, DatePattern, IntegerRange};

/// Ordered, finite sequence of formatted partition values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSequence {
    /// Explicit values, already rendered.
    Listed(Vec<String>),
    /// `first, first + step, ...` rendered with the range's padding.
    Integers {
        range: IntegerRange,
        first: i64,
        count: u64,
    },
    /// Grid points `origin + (first_step + i) * interval`.
    Dates {
        origin: NaiveDateTime,
        interval: DateInterval,
        pattern: DatePattern,
        first_step: u64,
        count: u64,
    },
}

impl ValueSequence {
    pub fn empty() -> Self {
        ValueSequence::Listed(Vec::new())
    }

    pub fn len(&self) -> u64 {
        match self {
            ValueSequence::Listed(values) => values.len() as u64,
            ValueSequence::Integers { count, .. } | ValueSequence::Dates { count, .. } => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the value at `index`.
    pub fn get(&self, index: u64) -> Option<String> {
        if index >= self.len() {
            return None;
        }
        match self {
            ValueSequence::Listed(values) => values.get(usize::try_from(index).ok()?).cloned(),
            ValueSequence::Integers { range, first, .. } => {
                let value = i128::from(*first) + i128::from(index) * i128::from(range.step);
                Some(range.render(i64::try_from(value).ok()?))
            }
            ValueSequence::Dates {
                origin,
                interval,
                pattern,
                first_step,
                ..
            } => {
                let ts = interval.advance(*origin, first_step.checked_add(index)?)?;
                Some(pattern.format(ts))
            }
        }
    }

    /// Iterate the rendered values in order.
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.len()).map_while(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use strata_core::IntervalUnit;

    #[test]
    fn test_integer_sequence_renders_lazily() {
        let seq = ValueSequence::Integers {
            range: IntegerRange::new(0, 10).with_step(2).with_digits(2),
            first: 4,
            count: 4,
        };
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.get(1), Some("06".to_string()));
        assert_eq!(seq.get(4), None);
        assert_eq!(seq.to_vec(), vec!["04", "06", "08", "10"]);
    }

    #[test]
    fn test_date_sequence_starts_at_first_step() {
        let origin = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let seq = ValueSequence::Dates {
            origin,
            interval: DateInterval::new(1, IntervalUnit::Months),
            pattern: DatePattern::compile("yyyy-MM").unwrap(),
            first_step: 2,
            count: 2,
        };
        assert_eq!(seq.to_vec(), vec!["2020-03", "2020-04"]);
    }

    #[test]
    fn test_empty_sequence() {
        assert!(ValueSequence::empty().is_empty());
        assert_eq!(ValueSequence::empty().iter().count(), 0);
    }
}
