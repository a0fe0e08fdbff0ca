//! strata core - partition projection data model
//!
//! Pure data structures shared by the engine and the metastore layer:
//! tables, typed values, predicates and column filters, projection specs,
//! partitions and their names, errors and configuration. No I/O happens in
//! this crate.

pub mod config;
pub mod date;
pub mod error;
pub mod filter;
pub mod partition;
pub mod predicate;
pub mod projection;
pub mod properties;
pub mod table;
pub mod value;

pub use config::{ProjectionConfig, DEFAULT_MAX_PARTITIONS};
pub use date::{DateBound, DateInterval, DatePattern, IntervalUnit};
pub use error::{
    ConfigError, MaterializationError, MetastoreError, ProjectionError, SpecError, StrataError,
    StrataResult,
};
pub use filter::ColumnFilter;
pub use partition::{
    escape_path_name, make_partition_name, parse_partition_name, unescape_path_name, Partition,
};
pub use predicate::{range_contains, PartitionFilter, Predicate};
pub use projection::{
    placeholder, ColumnProjection, DateRange, IntegerRange, ProjectedColumn, ProjectionSpec,
    ProjectionSpecDef,
};
pub use properties::{LOCATION_TEMPLATE, PROJECTION_ENABLED};
pub use table::{Column, ColumnType, Table};
pub use value::Value;
