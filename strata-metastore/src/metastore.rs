//! Metastore capability interface and the in-memory catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};
use strata_core::{
    MetastoreError, Partition, PartitionFilter, StrataError, StrataResult, Table, Value,
};
use strata_engine::EvaluationContext;

/// Partition lookups by name: every requested name, mapped to its partition
/// when one exists.
pub type PartitionsByName = BTreeMap<String, Option<Partition>>;

/// Catalog operations.
///
/// Implementations are shared across query threads. The two partition
/// lookups take the request's [`EvaluationContext`] so that every call made
/// on behalf of one query sees the same instant.
pub trait Metastore: Send + Sync {
    // === Database / Table Operations ===

    fn get_all_databases(&self) -> StrataResult<Vec<String>>;

    fn get_all_tables(&self, database: &str) -> StrataResult<Vec<String>>;

    fn get_table(&self, database: &str, table: &str) -> StrataResult<Option<Table>>;

    fn create_table(&self, table: Table) -> StrataResult<()>;

    fn drop_table(&self, database: &str, table: &str) -> StrataResult<()>;

    // === Partition Operations ===

    fn add_partitions(
        &self,
        database: &str,
        table: &str,
        partitions: Vec<Partition>,
    ) -> StrataResult<()>;

    /// Names of the partitions matching `filter`.
    ///
    /// `columns` are the table's partition columns in declaration order.
    fn get_partition_names_by_filter(
        &self,
        database: &str,
        table: &str,
        columns: &[String],
        filter: &PartitionFilter,
        ctx: &EvaluationContext,
    ) -> StrataResult<Vec<String>>;

    fn get_partitions_by_names(
        &self,
        database: &str,
        table: &str,
        names: &[String],
        ctx: &EvaluationContext,
    ) -> StrataResult<PartitionsByName>;
}

fn table_not_found(database: &str, table: &str) -> StrataError {
    StrataError::Metastore(MetastoreError::TableNotFound {
        database: database.to_string(),
        table: table.to_string(),
    })
}

// ============================================================================
// IN-MEMORY METASTORE
// ============================================================================

#[derive(Debug, Clone)]
struct TableEntry {
    table: Table,
    partitions: BTreeMap<String, Partition>,
}

/// Catalog held in memory. Partitions are stored explicitly.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMetastore {
    tables: Arc<RwLock<BTreeMap<(String, String), TableEntry>>>,
}

impl InMemoryMetastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored partitions of a table.
    pub fn partition_count(&self, database: &str, table: &str) -> StrataResult<usize> {
        let tables = self.tables.read().map_err(|_| MetastoreError::LockPoisoned)?;
        tables
            .get(&key(database, table))
            .map(|entry| entry.partitions.len())
            .ok_or_else(|| table_not_found(database, table))
    }
}

fn key(database: &str, table: &str) -> (String, String) {
    (database.to_string(), table.to_string())
}

/// Whether a stored partition may satisfy `filter`. Unknown outcomes match.
fn partition_matches(table: &Table, partition: &Partition, filter: &PartitionFilter) -> bool {
    filter.iter().all(|(column, predicate)| {
        let Some(column_type) = table.partition_column(column).map(|c| c.column_type) else {
            return true;
        };
        let value = partition
            .value(column)
            .map(|raw| Value::parse(raw, column_type).unwrap_or_else(|| Value::from(raw)));
        predicate.evaluate(value.as_ref()) != Some(false)
    })
}

impl Metastore for InMemoryMetastore {
    fn get_all_databases(&self) -> StrataResult<Vec<String>> {
        let tables = self.tables.read().map_err(|_| MetastoreError::LockPoisoned)?;
        let databases: BTreeSet<&String> = tables.keys().map(|(db, _)| db).collect();
        Ok(databases.into_iter().cloned().collect())
    }

    fn get_all_tables(&self, database: &str) -> StrataResult<Vec<String>> {
        let tables = self.tables.read().map_err(|_| MetastoreError::LockPoisoned)?;
        Ok(tables
            .keys()
            .filter(|(db, _)| db == database)
            .map(|(_, name)| name.clone())
            .collect())
    }

    fn get_table(&self, database: &str, table: &str) -> StrataResult<Option<Table>> {
        let tables = self.tables.read().map_err(|_| MetastoreError::LockPoisoned)?;
        Ok(tables.get(&key(database, table)).map(|e| e.table.clone()))
    }

    fn create_table(&self, table: Table) -> StrataResult<()> {
        let mut tables = self.tables.write().map_err(|_| MetastoreError::LockPoisoned)?;
        let k = key(&table.database_name, &table.table_name);
        if tables.contains_key(&k) {
            return Err(StrataError::Metastore(MetastoreError::TableAlreadyExists {
                database: table.database_name,
                table: table.table_name,
            }));
        }
        tables.insert(
            k,
            TableEntry {
                table,
                partitions: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn drop_table(&self, database: &str, table: &str) -> StrataResult<()> {
        let mut tables = self.tables.write().map_err(|_| MetastoreError::LockPoisoned)?;
        tables
            .remove(&key(database, table))
            .map(|_| ())
            .ok_or_else(|| table_not_found(database, table))
    }

    fn add_partitions(
        &self,
        database: &str,
        table: &str,
        partitions: Vec<Partition>,
    ) -> StrataResult<()> {
        let mut tables = self.tables.write().map_err(|_| MetastoreError::LockPoisoned)?;
        let entry = tables
            .get_mut(&key(database, table))
            .ok_or_else(|| table_not_found(database, table))?;

        // all or nothing
        let mut incoming = BTreeSet::new();
        for partition in &partitions {
            if entry.partitions.contains_key(&partition.name) || !incoming.insert(&partition.name)
            {
                return Err(StrataError::Metastore(
                    MetastoreError::PartitionAlreadyExists {
                        database: database.to_string(),
                        table: table.to_string(),
                        partition_name: partition.name.clone(),
                    },
                ));
            }
        }
        for partition in partitions {
            entry.partitions.insert(partition.name.clone(), partition);
        }
        Ok(())
    }

    fn get_partition_names_by_filter(
        &self,
        database: &str,
        table: &str,
        _columns: &[String],
        filter: &PartitionFilter,
        _ctx: &EvaluationContext,
    ) -> StrataResult<Vec<String>> {
        let tables = self.tables.read().map_err(|_| MetastoreError::LockPoisoned)?;
        let entry = tables
            .get(&key(database, table))
            .ok_or_else(|| table_not_found(database, table))?;
        Ok(entry
            .partitions
            .values()
            .filter(|p| partition_matches(&entry.table, p, filter))
            .map(|p| p.name.clone())
            .collect())
    }

    fn get_partitions_by_names(
        &self,
        database: &str,
        table: &str,
        names: &[String],
        _ctx: &EvaluationContext,
    ) -> StrataResult<PartitionsByName> {
        let tables = self.tables.read().map_err(|_| MetastoreError::LockPoisoned)?;
        let entry = tables
            .get(&key(database, table))
            .ok_or_else(|| table_not_found(database, table))?;
        Ok(names
            .iter()
            .map(|name| (name.clone(), entry.partitions.get(name).cloned()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{ColumnType, Predicate};

    fn logs_table() -> Table {
        Table::new("web", "logs", "s3://bucket/logs")
            .with_partition_column("region", ColumnType::Varchar)
            .with_partition_column("day", ColumnType::Integer)
    }

    fn partition(region: &str, day: i64) -> Partition {
        let values = vec![
            ("region".to_string(), region.to_string()),
            ("day".to_string(), day.to_string()),
        ];
        let name = strata_core::make_partition_name(&values);
        Partition {
            database_name: "web".to_string(),
            table_name: "logs".to_string(),
            location: format!("s3://bucket/logs/{}", name),
            values,
            name,
        }
    }

    fn store() -> InMemoryMetastore {
        let store = InMemoryMetastore::new();
        store.create_table(logs_table()).unwrap();
        store
            .add_partitions(
                "web",
                "logs",
                vec![partition("us", 1), partition("us", 2), partition("eu", 10)],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_table_lifecycle() {
        let store = store();
        assert_eq!(store.get_all_databases().unwrap(), vec!["web"]);
        assert_eq!(store.get_all_tables("web").unwrap(), vec!["logs"]);
        assert!(store.get_table("web", "logs").unwrap().is_some());
        assert!(store.get_table("web", "nope").unwrap().is_none());

        let duplicate = store.create_table(logs_table());
        assert!(matches!(
            duplicate,
            Err(StrataError::Metastore(MetastoreError::TableAlreadyExists { .. }))
        ));

        store.drop_table("web", "logs").unwrap();
        assert!(store.get_all_tables("web").unwrap().is_empty());
        assert!(matches!(
            store.drop_table("web", "logs"),
            Err(StrataError::Metastore(MetastoreError::TableNotFound { .. }))
        ));
    }

    #[test]
    fn test_add_partitions_is_atomic() {
        let store = store();
        let result = store.add_partitions(
            "web",
            "logs",
            vec![partition("ap", 3), partition("us", 1)],
        );
        assert!(matches!(
            result,
            Err(StrataError::Metastore(MetastoreError::PartitionAlreadyExists { .. }))
        ));
        assert_eq!(store.partition_count("web", "logs").unwrap(), 3);
    }

    #[test]
    fn test_filter_uses_typed_values() {
        let store = store();
        let ctx = EvaluationContext::new();
        let columns = logs_table().partition_column_names();
        let filter = PartitionFilter::all().with("day", Predicate::Gt(Value::Integer(1)));
        let names = store
            .get_partition_names_by_filter("web", "logs", &columns, &filter, &ctx)
            .unwrap();
        // numeric, not lexicographic: 10 > 1 and 2 > 1
        assert_eq!(names, vec!["region=eu/day=10", "region=us/day=2"]);

        let by_region = PartitionFilter::all().with("region", Predicate::eq("us"));
        let names = store
            .get_partition_names_by_filter("web", "logs", &columns, &by_region, &ctx)
            .unwrap();
        assert_eq!(names, vec!["region=us/day=1", "region=us/day=2"]);
    }

    #[test]
    fn test_get_partitions_by_names_marks_missing() {
        let store = store();
        let found = store
            .get_partitions_by_names(
                "web",
                "logs",
                &["region=us/day=1".to_string(), "region=us/day=9".to_string()],
                &EvaluationContext::new(),
            )
            .unwrap();
        assert!(found["region=us/day=1"].is_some());
        assert!(found["region=us/day=9"].is_none());
    }

    #[test]
    fn test_missing_table_errors() {
        let store = InMemoryMetastore::new();
        let result = store.get_partitions_by_names("web", "gone", &[], &EvaluationContext::new());
        assert!(matches!(
            result,
            Err(StrataError::Metastore(MetastoreError::TableNotFound { .. }))
        ));
    }
}
