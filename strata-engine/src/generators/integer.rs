use crate::{EvaluationContext, ValueGenerator, ValueSequence};
use std::ops::Bound;
use strata_core::{ColumnFilter, IntegerRange, StrataResult, Value};

/// `min..=max` stepping by `step`, optionally zero padded.
#[derive(Debug, Clone, Copy)]
pub struct IntegerGenerator<'a> {
    column: &'a str,
    range: &'a IntegerRange,
}

impl<'a> IntegerGenerator<'a> {
    pub fn new(column: &'a str, range: &'a IntegerRange) -> Self {
        Self { column, range }
    }

    /// Grid points within `[low, high]`, computed in i128 so no bound overflows.
    fn span(&self, low: i128, high: i128) -> ValueSequence {
        let min = i128::from(self.range.min);
        let step = i128::from(self.range.step);
        let low = low.max(min);
        let high = high.min(i128::from(self.range.max));
        if low > high || step <= 0 {
            return ValueSequence::empty();
        }
        let first = min + (low - min + step - 1).div_euclid(step) * step;
        if first > high {
            return ValueSequence::empty();
        }
        let count = (high - first) / step + 1;
        match (i64::try_from(first), u64::try_from(count)) {
            (Ok(first), Ok(count)) => ValueSequence::Integers {
                range: self.range.clone(),
                first,
                count,
            },
            _ => ValueSequence::empty(),
        }
    }

    fn listed(&self, mut values: Vec<i64>) -> ValueSequence {
        values.retain(|v| self.range.contains(*v));
        values.sort_unstable();
        values.dedup();
        ValueSequence::Listed(values.into_iter().map(|v| self.range.render(v)).collect())
    }
}

/// Inclusive lower limit of a bound; unusable bounds leave the side open.
fn lower_limit(bound: &Bound<Value>) -> i128 {
    match bound {
        Bound::Included(v) => v.as_integer().map_or(i128::MIN, i128::from),
        Bound::Excluded(v) => v.as_integer().map_or(i128::MIN, |v| i128::from(v) + 1),
        Bound::Unbounded => i128::MIN,
    }
}

fn upper_limit(bound: &Bound<Value>) -> i128 {
    match bound {
        Bound::Included(v) => v.as_integer().map_or(i128::MAX, i128::from),
        Bound::Excluded(v) => v.as_integer().map_or(i128::MAX, |v| i128::from(v) - 1),
        Bound::Unbounded => i128::MAX,
    }
}

impl ValueGenerator for IntegerGenerator<'_> {
    fn column(&self) -> &str {
        self.column
    }

    fn restricted(
        &self,
        filter: &ColumnFilter,
        _ctx: &EvaluationContext,
    ) -> StrataResult<ValueSequence> {
        let sequence = match filter {
            ColumnFilter::Unconstrained => self.span(i128::MIN, i128::MAX),
            ColumnFilter::Range { low, high } => self.span(lower_limit(low), upper_limit(high)),
            ColumnFilter::Equals(value) => {
                self.listed(value.as_integer().into_iter().collect())
            }
            ColumnFilter::Set(values) => {
                self.listed(values.iter().filter_map(Value::as_integer).collect())
            }
            ColumnFilter::None => ValueSequence::empty(),
        };
        Ok(sequence)
    }

    fn check(&self, raw: &str, _ctx: &EvaluationContext) -> Result<(), String> {
        let value: i64 = raw
            .parse()
            .map_err(|_| "not an integer".to_string())?;
        if self.range.render(value) != raw {
            return Err(format!(
                "expected canonical form '{}'",
                self.range.render(value)
            ));
        }
        if !self.range.contains(value) {
            return Err(format!(
                "outside {}..={} step {}",
                self.range.min, self.range.max, self.range.step
            ));
        }
        Ok(())
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_restricted_values_pass_check(
            min in -1000i64..1000,
            span in 0i64..500,
            step in 1i64..20,
            low in -1500i64..1500,
            width in 0i64..600,
        ) {
            let range = IntegerRange::new(min, min + span).with_step(step);
            let generator = IntegerGenerator::new("n", &range);
            let ctx = EvaluationContext::new();
            let seq = generator
                .restricted(&ColumnFilter::range(low, low + width), &ctx)
                .unwrap();
            for raw in seq.iter() {
                prop_assert!(generator.check(&raw, &ctx).is_ok());
                let v: i64 = raw.parse().unwrap();
                prop_assert!(v >= low && v <= low + width);
            }
            let expected = (min..=min + span)
                .step_by(step as usize)
                .filter(|v| *v >= low && *v <= low + width)
                .count() as u64;
            prop_assert_eq!(seq.len(), expected);
        }
    }
}
