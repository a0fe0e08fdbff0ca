//! Partition projection explorer.
//!
//! Usage: strata-project <table.toml> [column=value ...]
//!
//! Loads a table definition, lists the partitions its projection produces
//! under the given equality predicates and prints each name with its
//! storage location.
//!
//! Environment:
//! - `RUST_LOG`: log filter (default `strata=info`)
//! - `STRATA_LOG_FORMAT`: `json` for JSON log lines
//! - `STRATA_PROJECTION_ENABLED`, `STRATA_PROJECTION_MAX_PARTITIONS`

use std::fs;
use std::sync::Arc;
use strata_core::{PartitionFilter, Predicate, ProjectionConfig, Table, Value};
use strata_engine::EvaluationContext;
use strata_metastore::{
    decorate_metastore, InMemoryMetastore, Metastore, MetastoreDecorator,
    PartitionProjectionDecorator,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("strata=info"));
    let json = std::env::var("STRATA_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("Failed to init logging: {}", e);
    }
}

/// Turn `column=value` arguments into equality predicates typed by the
/// table's partition columns.
fn parse_filter(table: &Table, args: &[String]) -> Result<PartitionFilter, String> {
    args.iter().try_fold(PartitionFilter::all(), |filter, arg| {
        let (column, raw) = arg
            .split_once('=')
            .ok_or_else(|| format!("expected column=value, got '{}'", arg))?;
        let column_type = table
            .partition_column(column)
            .map(|c| c.column_type)
            .ok_or_else(|| format!("'{}' is not a partition column", column))?;
        let value = Value::parse(raw, column_type).unwrap_or_else(|| Value::from(raw));
        Ok(filter.with(column, Predicate::Eq(value)))
    })
}

fn run(args: &[String]) -> Result<(), String> {
    let path = args
        .first()
        .ok_or_else(|| "Usage: strata-project <table.toml> [column=value ...]".to_string())?;
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    let table: Table =
        toml::from_str(&content).map_err(|e| format!("Invalid table definition: {}", e))?;
    let filter = parse_filter(&table, &args[1..])?;

    let config = ProjectionConfig::from_env();
    config.validate().map_err(|e| e.to_string())?;

    let catalog = InMemoryMetastore::new();
    catalog.create_table(table.clone()).map_err(|e| e.to_string())?;
    let decorators: Vec<Arc<dyn MetastoreDecorator>> =
        vec![Arc::new(PartitionProjectionDecorator::new(config))];
    let metastore = decorate_metastore(Arc::new(catalog), &decorators);

    let ctx = EvaluationContext::new();
    let columns = table.partition_column_names();
    let names = metastore
        .get_partition_names_by_filter(
            &table.database_name,
            &table.table_name,
            &columns,
            &filter,
            &ctx,
        )
        .map_err(|e| e.to_string())?;
    let partitions = metastore
        .get_partitions_by_names(&table.database_name, &table.table_name, &names, &ctx)
        .map_err(|e| e.to_string())?;

    tracing::info!(
        table = %table.qualified_name(),
        partitions = names.len(),
        "Projection listed"
    );
    for name in &names {
        match partitions.get(name) {
            Some(Some(partition)) => println!("{}\t{}", name, partition.location),
            _ => println!("{}", name),
        }
    }
    Ok(())
}

fn main() {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
