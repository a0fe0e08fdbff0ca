use crate::{EvaluationContext, ValueGenerator, ValueSequence};
use chrono::NaiveDateTime;
use std::ops::Bound;
use strata_core::{
    ColumnFilter, DateRange, ProjectionError, StrataError, StrataResult, Value,
};

/// Calendar grid from `min` to `max` at `interval` boundaries.
#[derive(Debug, Clone, Copy)]
pub struct DateGenerator<'a> {
    column: &'a str,
    range: &'a DateRange,
}

impl<'a> DateGenerator<'a> {
    pub fn new(column: &'a str, range: &'a DateRange) -> Self {
        Self { column, range }
    }

    /// Resolve both ends against the context instant.
    fn bounds(&self, ctx: &EvaluationContext) -> StrataResult<(NaiveDateTime, NaiveDateTime)> {
        let resolve = |bound: &strata_core::DateBound| {
            bound
                .resolve(ctx.now(), &self.range.pattern)
                .ok_or_else(|| {
                    StrataError::Projection(ProjectionError::ArithmeticOverflow {
                        column: self.column.to_string(),
                    })
                })
        };
        Ok((resolve(&self.range.min)?, resolve(&self.range.max)?))
    }

    /// Typed view of a filter operand.
    fn instant(&self, value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::String(text) => self.range.pattern.parse(text),
            other => other.as_datetime(),
        }
    }

    fn sequence(&self, origin: NaiveDateTime, first_step: u64, last_step: u64) -> ValueSequence {
        if first_step > last_step {
            return ValueSequence::empty();
        }
        ValueSequence::Dates {
            origin,
            interval: self.range.interval,
            pattern: self.range.pattern.clone(),
            first_step,
            count: last_step - first_step + 1,
        }
    }

    /// First grid step admitted by the lower bound.
    fn first_step(&self, origin: NaiveDateTime, low: &Bound<Value>) -> Option<u64> {
        let interval = &self.range.interval;
        let (target, exclusive) = match low {
            Bound::Unbounded => return Some(0),
            Bound::Included(v) => match self.instant(v) {
                Some(ts) => (ts, false),
                None => return Some(0),
            },
            Bound::Excluded(v) => match self.instant(v) {
                Some(ts) => (ts, true),
                None => return Some(0),
            },
        };
        let step = interval.steps_to_reach(origin, target)?;
        if exclusive && interval.advance(origin, step)? == target {
            step.checked_add(1)
        } else {
            Some(step)
        }
    }

    /// Last grid step admitted by the upper bound; `None` when nothing is.
    fn last_step(&self, origin: NaiveDateTime, high: &Bound<Value>) -> Option<Option<u64>> {
        let interval = &self.range.interval;
        let (target, exclusive) = match high {
            Bound::Unbounded => return Some(None),
            Bound::Included(v) => match self.instant(v) {
                Some(ts) => (ts, false),
                None => return Some(None),
            },
            Bound::Excluded(v) => match self.instant(v) {
                Some(ts) => (ts, true),
                None => return Some(None),
            },
        };
        let step = interval.steps_within(origin, target)?;
        if exclusive && interval.advance(origin, step)? == target {
            step.checked_sub(1).map(Some)
        } else {
            Some(Some(step))
        }
    }

    fn listed(
        &self,
        values: &[Value],
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> ValueSequence {
        let mut instants: Vec<NaiveDateTime> = values
            .iter()
            .filter_map(|v| self.instant(v))
            .filter(|ts| *ts >= min && *ts <= max && self.range.interval.is_on_grid(min, *ts))
            .collect();
        instants.sort_unstable();
        instants.dedup();
        ValueSequence::Listed(
            instants
                .into_iter()
                .map(|ts| self.range.pattern.format(ts))
                .collect(),
        )
    }
}

impl ValueGenerator for DateGenerator<'_> {
    fn column(&self) -> &str {
        self.column
    }

    fn restricted(
        &self,
        filter: &ColumnFilter,
        ctx: &EvaluationContext,
    ) -> StrataResult<ValueSequence> {
        let (min, max) = self.bounds(ctx)?;
        if min > max {
            return Ok(ValueSequence::empty());
        }
        let Some(last_by_max) = self.range.interval.steps_within(min, max) else {
            return Ok(ValueSequence::empty());
        };
        let sequence = match filter {
            ColumnFilter::Unconstrained => self.sequence(min, 0, last_by_max),
            ColumnFilter::Range { low, high } => {
                let first = self.first_step(min, low);
                let last = self.last_step(min, high);
                match (first, last) {
                    (Some(first), Some(last)) => {
                        let last = last.map_or(last_by_max, |l| l.min(last_by_max));
                        self.sequence(min, first, last)
                    }
                    _ => ValueSequence::empty(),
                }
            }
            ColumnFilter::Equals(value) => self.listed(std::slice::from_ref(value), min, max),
            ColumnFilter::Set(values) => self.listed(values, min, max),
            ColumnFilter::None => ValueSequence::empty(),
        };
        Ok(sequence)
    }

    fn check(&self, raw: &str, ctx: &EvaluationContext) -> Result<(), String> {
        let ts = self
            .range
            .pattern
            .parse(raw)
            .ok_or_else(|| format!("does not match pattern '{}'", self.range.pattern))?;
        let (min, max) = self.bounds(ctx).map_err(|e| e.to_string())?;
        if ts < min || ts > max {
            return Err(format!(
                "outside {}..={}",
                self.range.pattern.format(min),
                self.range.pattern.format(max)
            ));
        }
        if !self.range.interval.is_on_grid(min, ts) {
            return Err(format!("not on the {} grid", self.range.interval));
        }
        Ok(())
    }
}
