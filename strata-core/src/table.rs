//! Table descriptions consumed from the catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Logical type of a column, as far as projection cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Varchar,
    Integer,
    BigInt,
    Date,
    Timestamp,
}

impl ColumnType {
    /// Whether the type holds whole numbers.
    pub fn is_integral(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::BigInt)
    }

    /// Whether the type holds calendar values.
    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Timestamp)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Varchar => "varchar",
            ColumnType::Integer => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Table metadata as returned by a metastore lookup.
///
/// `parameters` carries the raw table properties, including any
/// `projection.*` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub database_name: String,
    pub table_name: String,
    #[serde(default)]
    pub data_columns: Vec<Column>,
    #[serde(default)]
    pub partition_columns: Vec<Column>,
    pub storage_location: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Table {
    /// Create an unpartitioned table with no columns.
    pub fn new(
        database_name: impl Into<String>,
        table_name: impl Into<String>,
        storage_location: impl Into<String>,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            table_name: table_name.into(),
            data_columns: Vec::new(),
            partition_columns: Vec::new(),
            storage_location: storage_location.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Append a data column.
    pub fn with_data_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.data_columns.push(Column::new(name, column_type));
        self
    }

    /// Append a partition column. Declaration order is significant.
    pub fn with_partition_column(
        mut self,
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        self.partition_columns.push(Column::new(name, column_type));
        self
    }

    /// Set a table property.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// `database.table`, used in logs and errors.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database_name, self.table_name)
    }

    /// Partition column names in declared order.
    pub fn partition_column_names(&self) -> Vec<String> {
        self.partition_columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Look up a partition column by name.
    pub fn partition_column(&self, name: &str) -> Option<&Column> {
        self.partition_columns.iter().find(|c| c.name == name)
    }
}
