use crate::{EvaluationContext, ValueGenerator, ValueSequence};
use strata_core::{ColumnFilter, StrataResult};

/// Declared list of literal values.
#[derive(Debug, Clone, Copy)]
pub struct EnumGenerator<'a> {
    column: &'a str,
    values: &'a [String],
}

impl<'a> EnumGenerator<'a> {
    pub fn new(column: &'a str, values: &'a [String]) -> Self {
        Self { column, values }
    }
}

impl ValueGenerator for EnumGenerator<'_> {
    fn column(&self) -> &str {
        self.column
    }

    fn restricted(
        &self,
        filter: &ColumnFilter,
        _ctx: &EvaluationContext,
    ) -> StrataResult<ValueSequence> {
        let values = match filter {
            ColumnFilter::Unconstrained => self.values.to_vec(),
            ColumnFilter::Equals(wanted) => {
                let wanted = wanted.to_string();
                self.values
                    .iter()
                    .filter(|v| **v == wanted)
                    .cloned()
                    .collect()
            }
            ColumnFilter::Set(members) => {
                let members: Vec<String> = members.iter().map(ToString::to_string).collect();
                self.values
                    .iter()
                    .filter(|v| members.contains(v))
                    .cloned()
                    .collect()
            }
            // enum values carry no ordering to range over
            ColumnFilter::Range { .. } | ColumnFilter::None => Vec::new(),
        };
        Ok(ValueSequence::Listed(values))
    }

    fn check(&self, raw: &str, _ctx: &EvaluationContext) -> Result<(), String> {
        if self.values.iter().any(|v| v == raw) {
            Ok(())
        } else {
            Err(format!("not one of the declared values {:?}", self.values))
        }
    }
}
