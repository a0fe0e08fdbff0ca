//! Metastore chains with the partition projection layer installed

use std::sync::Arc;
use strata_core::{make_partition_name, Partition};
use strata_engine::EvaluationContext;
use strata_metastore::*;
use strata_test_utils::assertions::*;
use strata_test_utils::fixtures::*;
use strata_test_utils::*;

fn chain(config: ProjectionConfig, tables: Vec<Table>) -> (InMemoryMetastore, Arc<dyn Metastore>) {
    let catalog = InMemoryMetastore::new();
    for table in tables {
        catalog.create_table(table).unwrap();
    }
    let decorators: Vec<Arc<dyn MetastoreDecorator>> =
        vec![Arc::new(PartitionProjectionDecorator::new(config))];
    let metastore = decorate_metastore(Arc::new(catalog.clone()), &decorators);
    (catalog, metastore)
}

fn stored_partition(table: &Table, region: &str, dt: &str) -> Partition {
    let values = vec![
        ("region".to_string(), region.to_string()),
        ("dt".to_string(), dt.to_string()),
    ];
    let name = make_partition_name(&values);
    Partition {
        database_name: table.database_name.clone(),
        table_name: table.table_name.clone(),
        location: format!("{}/{}", table.storage_location, name),
        values,
        name,
    }
}

#[test]
fn projected_table_never_reads_stored_partitions() {
    let table = projected_table();
    let (_, metastore) = chain(ProjectionConfig::default(), vec![table.clone()]);
    let ctx = EvaluationContext::new();
    let filter = PartitionFilter::all()
        .with("region", Predicate::eq("eu-west"))
        .with("id", Predicate::Gte(Value::Integer(8)))
        .with("dt", Predicate::eq("2020-01-02"));
    let names = metastore
        .get_partition_names_by_filter(
            "web",
            "events",
            &table.partition_column_names(),
            &filter,
            &ctx,
        )
        .unwrap();
    assert_eq!(
        names,
        vec![
            "region=eu-west/id=08/dt=2020-01-02",
            "region=eu-west/id=10/dt=2020-01-02",
        ]
    );

    let partitions = metastore
        .get_partitions_by_names("web", "events", &names, &ctx)
        .unwrap();
    assert_eq!(partitions.len(), 2);
    for (name, partition) in &partitions {
        let partition = partition.as_ref().unwrap();
        assert_eq!(&partition.name, name);
        assert_eq!(partition.location, format!("s3://bucket/events/{}", name));
    }
}

#[test]
fn plain_table_is_forwarded() {
    let table = plain_table();
    let (catalog, metastore) = chain(ProjectionConfig::default(), vec![table.clone()]);
    catalog
        .add_partitions(
            "web",
            "logs",
            vec![
                stored_partition(&table, "us", "2020-01-01"),
                stored_partition(&table, "eu", "2020-01-01"),
            ],
        )
        .unwrap();
    let ctx = EvaluationContext::new();
    let names = metastore
        .get_partition_names_by_filter(
            "web",
            "logs",
            &table.partition_column_names(),
            &PartitionFilter::all().with("region", Predicate::eq("us")),
            &ctx,
        )
        .unwrap();
    assert_eq!(names, vec!["region=us/dt=2020-01-01"]);

    let missing = metastore
        .get_partitions_by_names("web", "logs", &["region=ap/dt=2020-01-01".to_string()], &ctx)
        .unwrap();
    assert_eq!(missing["region=ap/dt=2020-01-01"], None);
}

#[test]
fn disabled_projection_forwards_projected_table() {
    let table = projected_table();
    let (_, metastore) = chain(
        ProjectionConfig::default().with_enabled(false),
        vec![table.clone()],
    );
    let names = metastore
        .get_partition_names_by_filter(
            "web",
            "events",
            &table.partition_column_names(),
            &PartitionFilter::all(),
            &EvaluationContext::new(),
        )
        .unwrap();
    assert!(names.is_empty());
}

#[test]
fn dropped_table_reports_not_found() {
    let table = projected_table();
    let (catalog, metastore) = chain(ProjectionConfig::default(), vec![table.clone()]);
    catalog.drop_table("web", "events").unwrap();
    let result = metastore.get_partition_names_by_filter(
        "web",
        "events",
        &table.partition_column_names(),
        &PartitionFilter::all(),
        &EvaluationContext::new(),
    );
    assert_table_not_found(&result, "web", "events");
}

#[test]
fn limit_and_injected_errors_surface() {
    let table = projected_table();
    let injected = injected_table();
    let (_, metastore) = chain(config_with_limit(10), vec![table.clone(), injected.clone()]);
    let ctx = EvaluationContext::new();

    let result = metastore.get_partition_names_by_filter(
        "web",
        "events",
        &table.partition_column_names(),
        &PartitionFilter::all(),
        &ctx,
    );
    assert_limit_exceeded(&result, 10);

    let result = metastore.get_partition_names_by_filter(
        "web",
        "tenants",
        &injected.partition_column_names(),
        &PartitionFilter::all(),
        &ctx,
    );
    assert_injected_unbound(&result, "tenant");

    let names = metastore
        .get_partition_names_by_filter(
            "web",
            "tenants",
            &injected.partition_column_names(),
            &PartitionFilter::all().with("tenant", Predicate::eq("acme")),
            &ctx,
        )
        .unwrap();
    let partitions = metastore
        .get_partitions_by_names("web", "tenants", &names, &ctx)
        .unwrap();
    let acme = partitions["tenant=acme"].as_ref().unwrap();
    assert_eq!(acme.location, "s3://bucket/tenants/acme/");
}

#[test]
fn malformed_spec_fails_before_generation() {
    let table = projected_table().with_parameter("projection.id.range", "10,0");
    let (_, metastore) = chain(ProjectionConfig::default(), vec![table.clone()]);
    let result = metastore.get_partition_names_by_filter(
        "web",
        "events",
        &table.partition_column_names(),
        &PartitionFilter::all(),
        &EvaluationContext::new(),
    );
    assert_spec_error(&result);
}

#[test]
fn materialization_errors_propagate() {
    let table = projected_table();
    let (_, metastore) = chain(ProjectionConfig::default(), vec![table]);
    let result = metastore.get_partitions_by_names(
        "web",
        "events",
        &["region=us-east/id=03/dt=2020-01-01".to_string()],
        &EvaluationContext::new(),
    );
    assert_out_of_domain(&result, "id");
}

#[test]
fn pass_through_operations_reach_catalog() {
    let (catalog, metastore) = chain(ProjectionConfig::default(), vec![projected_table()]);
    metastore.create_table(plain_table()).unwrap();
    assert_eq!(catalog.get_all_tables("web").unwrap(), vec!["events", "logs"]);
    assert_eq!(metastore.get_all_databases().unwrap(), vec!["web"]);
    assert!(metastore.get_table("web", "logs").unwrap().is_some());
    metastore.drop_table("web", "logs").unwrap();
    assert_eq!(metastore.get_all_tables("web").unwrap(), vec!["events"]);
}

#[test]
fn demo_table_definition_parses() {
    let table: Table = toml::from_str(include_str!("../../demos/events.toml")).unwrap();
    let spec = ProjectionSpec::from_table(&table).unwrap().unwrap();
    assert_eq!(spec.column_names(), vec!["region", "dt"]);
    assert_eq!(
        spec.location_template(),
        Some("s3://bucket/events/${region}/${dt}/")
    );
}
