//! strata metastore - catalog interface and projection interception
//!
//! - [`Metastore`]: the catalog capability interface
//! - [`InMemoryMetastore`]: an explicit, in-memory catalog
//! - [`MetastoreDecorator`] and [`decorate_metastore`]: priority-ordered layers
//! - [`PartitionProjectionMetastore`]: answers partition queries of projected
//!   tables from their projection spec

pub mod decorator;
pub mod metastore;
pub mod projection;

pub use decorator::{decorate_metastore, MetastoreDecorator};
pub use metastore::{InMemoryMetastore, Metastore, PartitionsByName};
pub use projection::{
    PartitionProjectionDecorator, PartitionProjectionMetastore, PARTITION_PROJECTION_PRIORITY,
};
