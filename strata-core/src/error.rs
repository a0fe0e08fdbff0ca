//! Error types for strata operations

use thiserror::Error;

/// Metastore (catalog) errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetastoreError {
    /// The table disappeared between planning and metadata lookup.
    #[error("Table does not exist: {database}.{table}")]
    TableNotFound { database: String, table: String },

    #[error("Table already exists: {database}.{table}")]
    TableAlreadyExists { database: String, table: String },

    #[error("Partition {partition_name} already exists in {database}.{table}")]
    PartitionAlreadyExists {
        database: String,
        table: String,
        partition_name: String,
    },

    #[error("Metastore lock poisoned")]
    LockPoisoned,
}

/// Malformed projection properties, raised while a table is read into a `ProjectionSpec`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("Missing projection property {property} for column {column}")]
    MissingProperty { column: String, property: String },

    #[error("Invalid projection property {property} for column {column}: {value} - {reason}")]
    InvalidProperty {
        column: String,
        property: String,
        value: String,
        reason: String,
    },

    #[error("Projected columns {actual:?} do not match partition columns {expected:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Column {column} of type {column_type} cannot use {projection} projection")]
    UnsupportedColumnType {
        column: String,
        column_type: String,
        projection: String,
    },

    #[error("Storage location template {template} is missing placeholder for column {column}")]
    MissingTemplatePlaceholder { template: String, column: String },
}

/// Errors raised while generating partition names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("Injected column {column} requires a single equality predicate in the query")]
    InjectedColumnUnbound { column: String },

    #[error("Partition projection would produce {requested} partitions, limit is {limit}")]
    PartitionLimitExceeded { limit: u64, requested: u128 },

    #[error("Arithmetic overflow while projecting column {column}")]
    ArithmeticOverflow { column: String },
}

/// Errors raised while reconstructing a partition from its name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MaterializationError {
    #[error("Invalid partition name {name}: {reason}")]
    InvalidPartitionName { name: String, reason: String },

    #[error("Value {value} is outside the projected domain of column {column}: {reason}")]
    PartitionValueOutOfDomain {
        column: String,
        value: String,
        reason: String,
    },

    #[error("Unresolved placeholder {placeholder} in storage location template {template}")]
    UnresolvedTemplate { placeholder: String, template: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all strata errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrataError {
    #[error("Metastore error: {0}")]
    Metastore(#[from] MetastoreError),

    #[error("Malformed projection spec: {0}")]
    Spec(#[from] SpecError),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Materialization error: {0}")]
    Materialization(#[from] MaterializationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for strata operations.
pub type StrataResult<T> = Result<T, StrataError>;

// =============================================================================
// TESTS
// =============================================================================
