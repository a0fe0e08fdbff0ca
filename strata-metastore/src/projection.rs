//! Partition projection as a metastore decorator.
//!
//! For a projected table, partition listing and lookup are answered by the
//! projection engine; every other call, and every call on a table without
//! projection, goes to the wrapped metastore unchanged.

use crate::{Metastore, MetastoreDecorator, PartitionsByName};
use std::sync::Arc;
use strata_core::{
    MetastoreError, Partition, PartitionFilter, ProjectionConfig, ProjectionSpec, StrataError,
    StrataResult, Table,
};
use strata_engine::{EvaluationContext, PartitionProjection};
use tracing::{debug, warn};

/// Priority of the projection layer among metastore decorators.
pub const PARTITION_PROJECTION_PRIORITY: i32 = 100;

/// Installs [`PartitionProjectionMetastore`] in a decorator chain.
#[derive(Debug, Clone)]
pub struct PartitionProjectionDecorator {
    config: ProjectionConfig,
}

impl PartitionProjectionDecorator {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }
}

impl MetastoreDecorator for PartitionProjectionDecorator {
    fn priority(&self) -> i32 {
        PARTITION_PROJECTION_PRIORITY
    }

    fn name(&self) -> &str {
        "partition-projection"
    }

    fn decorate(&self, inner: Arc<dyn Metastore>) -> Arc<dyn Metastore> {
        Arc::new(PartitionProjectionMetastore::new(inner, self.config.clone()))
    }
}

/// Metastore that answers partition queries of projected tables itself.
pub struct PartitionProjectionMetastore {
    inner: Arc<dyn Metastore>,
    config: ProjectionConfig,
}

impl PartitionProjectionMetastore {
    pub fn new(inner: Arc<dyn Metastore>, config: ProjectionConfig) -> Self {
        Self { inner, config }
    }

    /// The table and its projection, when projection applies to it.
    ///
    /// A table that vanished since planning is reported as
    /// [`MetastoreError::TableNotFound`].
    fn projection_for(
        &self,
        database: &str,
        table: &str,
    ) -> StrataResult<Option<(Table, PartitionProjection)>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let table = self.inner.get_table(database, table)?.ok_or_else(|| {
            StrataError::Metastore(MetastoreError::TableNotFound {
                database: database.to_string(),
                table: table.to_string(),
            })
        })?;
        Ok(ProjectionSpec::from_table(&table)?
            .map(|spec| PartitionProjection::new(spec, &self.config))
            .map(|projection| (table, projection)))
    }
}

impl Metastore for PartitionProjectionMetastore {
    fn get_all_databases(&self) -> StrataResult<Vec<String>> {
        self.inner.get_all_databases()
    }

    fn get_all_tables(&self, database: &str) -> StrataResult<Vec<String>> {
        self.inner.get_all_tables(database)
    }

    fn get_table(&self, database: &str, table: &str) -> StrataResult<Option<Table>> {
        self.inner.get_table(database, table)
    }

    fn create_table(&self, table: Table) -> StrataResult<()> {
        self.inner.create_table(table)
    }

    fn drop_table(&self, database: &str, table: &str) -> StrataResult<()> {
        self.inner.drop_table(database, table)
    }

    fn add_partitions(
        &self,
        database: &str,
        table: &str,
        partitions: Vec<Partition>,
    ) -> StrataResult<()> {
        self.inner.add_partitions(database, table, partitions)
    }

    fn get_partition_names_by_filter(
        &self,
        database: &str,
        table: &str,
        columns: &[String],
        filter: &PartitionFilter,
        ctx: &EvaluationContext,
    ) -> StrataResult<Vec<String>> {
        match self.projection_for(database, table)? {
            Some((_, projection)) => {
                debug!(database, table, "Listing partitions through projection");
                projection.list_partition_names(columns, filter, ctx)
            }
            None => {
                debug!(database, table, "Projection not applicable, forwarding");
                self.inner
                    .get_partition_names_by_filter(database, table, columns, filter, ctx)
            }
        }
    }

    fn get_partitions_by_names(
        &self,
        database: &str,
        table: &str,
        names: &[String],
        ctx: &EvaluationContext,
    ) -> StrataResult<PartitionsByName> {
        let Some((table_meta, projection)) = self.projection_for(database, table)? else {
            return self
                .inner
                .get_partitions_by_names(database, table, names, ctx);
        };
        debug!(
            database,
            table,
            names = names.len(),
            "Materializing partitions through projection"
        );
        names
            .iter()
            .map(|name| {
                projection
                    .materialize(&table_meta, name, ctx)
                    .map(|partition| (name.clone(), Some(partition)))
                    .map_err(|e| {
                        warn!(database, table, name = %name, error = %e, "Partition materialization failed");
                        e
                    })
            })
            .collect()
    }
}
