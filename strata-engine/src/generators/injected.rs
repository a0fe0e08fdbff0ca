use crate::{EvaluationContext, ValueGenerator, ValueSequence};
use strata_core::{ColumnFilter, ProjectionError, StrataError, StrataResult};

/// Column whose value must be supplied by the query.
#[derive(Debug, Clone, Copy)]
pub struct InjectedGenerator<'a> {
    column: &'a str,
}

impl<'a> InjectedGenerator<'a> {
    pub fn new(column: &'a str) -> Self {
        Self { column }
    }
}

impl ValueGenerator for InjectedGenerator<'_> {
    fn column(&self) -> &str {
        self.column
    }

    fn restricted(
        &self,
        filter: &ColumnFilter,
        _ctx: &EvaluationContext,
    ) -> StrataResult<ValueSequence> {
        match filter {
            ColumnFilter::Equals(value) => Ok(ValueSequence::Listed(vec![value.to_string()])),
            ColumnFilter::None => Ok(ValueSequence::empty()),
            _ => Err(StrataError::Projection(
                ProjectionError::InjectedColumnUnbound {
                    column: self.column.to_string(),
                },
            )),
        }
    }

    fn check(&self, _raw: &str, _ctx: &EvaluationContext) -> Result<(), String> {
        Ok(())
    }
}
