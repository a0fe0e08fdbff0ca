//! strata engine - partition projection
//!
//! Derives partition metadata from a [`ProjectionSpec`](strata_core::ProjectionSpec)
//! instead of a catalog:
//!
//! - [`generators`]: one value generator per projection kind
//! - [`restrictor`]: predicates to per-column [`ColumnFilter`](strata_core::ColumnFilter)s
//! - [`PartitionProjection::list_partition_names`]: pruned, bounded listing
//! - [`PartitionProjection::materialize`]: partition reconstruction from a name
//!
//! Everything here is a pure function of its inputs and the
//! [`EvaluationContext`] captured for the request.

pub mod context;
pub mod engine;
pub mod generators;
pub mod reconstructor;
pub mod restrictor;
pub mod sequence;

pub use context::EvaluationContext;
pub use engine::PartitionProjection;
pub use generators::{generator_for, ValueGenerator};
pub use reconstructor::{default_location, substitute};
pub use restrictor::{restrict, restrict_all};
pub use sequence::ValueSequence;
