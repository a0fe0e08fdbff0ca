//! Per-column value generators, one per projection kind.
//!
//! Each generator produces the full ordered value sequence of its column,
//! or the sequence restricted by a [`ColumnFilter`], and decides whether a
//! raw value read back from a partition name belongs to its domain.

mod date;
mod enumeration;
mod injected;
mod integer;

pub use date::DateGenerator;
pub use enumeration::EnumGenerator;
pub use injected::InjectedGenerator;
pub use integer::IntegerGenerator;

use crate::{EvaluationContext, ValueSequence};
use strata_core::{ColumnFilter, ColumnProjection, ProjectedColumn, StrataResult};

/// Generates the values of one projected column.
pub trait ValueGenerator {
    /// Column this generator serves.
    fn column(&self) -> &str;

    /// Values admitted by `filter`, in projection order.
    fn restricted(
        &self,
        filter: &ColumnFilter,
        ctx: &EvaluationContext,
    ) -> StrataResult<ValueSequence>;

    /// Every value of the column.
    fn values(&self, ctx: &EvaluationContext) -> StrataResult<ValueSequence> {
        self.restricted(&ColumnFilter::Unconstrained, ctx)
    }

    /// Check a raw (unescaped) value against the column's domain.
    ///
    /// Returns the reason on rejection.
    fn check(&self, raw: &str, ctx: &EvaluationContext) -> Result<(), String>;
}

/// Build the generator for a projected column.
pub fn generator_for(column: &ProjectedColumn) -> Box<dyn ValueGenerator + '_> {
    let name = column.name.as_str();
    match &column.projection {
        ColumnProjection::Enum { values } => Box::new(EnumGenerator::new(name, values)),
        ColumnProjection::IntegerRange(range) => Box::new(IntegerGenerator::new(name, range)),
        ColumnProjection::DateRange(range) => Box::new(DateGenerator::new(name, range)),
        ColumnProjection::Injected => Box::new(InjectedGenerator::new(name)),
    }
}
