//! Listing and materialization behaviour of the projection engine

use strata_engine::{EvaluationContext, PartitionProjection};
use strata_test_utils::assertions::*;
use strata_test_utils::fixtures::*;
use strata_test_utils::*;

fn list(engine: &PartitionProjection, filter: &PartitionFilter) -> StrataResult<Vec<String>> {
    let columns = engine.spec().column_names();
    engine.list_partition_names(&columns, filter, &EvaluationContext::new())
}

#[test]
fn enum_without_filter_lists_declared_order() {
    let engine = PartitionProjection::new(enum_spec(&["a", "b", "c"]), &ProjectionConfig::default());
    assert_eq!(
        list(&engine, &PartitionFilter::all()).unwrap(),
        vec!["col=a", "col=b", "col=c"]
    );
}

#[test]
fn integer_range_filter_pads_values() {
    let spec = spec(vec![integer_column(
        "id",
        IntegerRange::new(0, 10).with_step(2).with_digits(2),
    )]);
    let engine = PartitionProjection::new(spec, &ProjectionConfig::default());
    let filter = PartitionFilter::all().with("id", Predicate::between(4i64, 10i64));
    assert_eq!(
        list(&engine, &filter).unwrap(),
        vec!["id=04", "id=06", "id=08", "id=10"]
    );
}

#[test]
fn string_bounds_on_integer_column_combine_numerically() {
    let engine = PartitionProjection::new(
        spec(vec![integer_column("id", IntegerRange::new(0, 100))]),
        &ProjectionConfig::default(),
    );
    let joined = PartitionFilter::all().with(
        "id",
        Predicate::And(vec![
            Predicate::Gte(Value::from("9")),
            Predicate::Lte(Value::from("10")),
        ]),
    );
    assert_eq!(list(&engine, &joined).unwrap(), vec!["id=9", "id=10"]);

    let pinned = PartitionFilter::all().with(
        "id",
        Predicate::And(vec![Predicate::eq("15"), Predicate::between("9", "100")]),
    );
    assert_eq!(list(&engine, &pinned).unwrap(), vec!["id=15"]);
}

#[test]
fn date_range_lists_day_boundaries() {
    let spec = spec(vec![daily_column(
        "dt",
        midnight(2020, 1, 1),
        midnight(2020, 1, 3),
    )]);
    let engine = PartitionProjection::new(spec, &ProjectionConfig::default());
    assert_eq!(
        list(&engine, &PartitionFilter::all()).unwrap(),
        vec!["dt=2020-01-01", "dt=2020-01-02", "dt=2020-01-03"]
    );
}

#[test]
fn injected_column_requires_equality() {
    let engine = PartitionProjection::new(
        spec(vec![injected_column("region")]),
        &ProjectionConfig::default(),
    );
    assert_injected_unbound(&list(&engine, &PartitionFilter::all()), "region");

    let bound = PartitionFilter::all().with("region", Predicate::eq("us-east"));
    assert_eq!(list(&engine, &bound).unwrap(), vec!["region=us-east"]);

    let in_list = PartitionFilter::all().with("region", Predicate::in_list(["a", "b"]));
    assert_injected_unbound(&list(&engine, &in_list), "region");
}

#[test]
fn two_columns_enumerate_outer_first() {
    let spec = spec(vec![
        enum_column("a", &["1", "2", "3"]),
        enum_column("b", &["x", "y", "z"]),
    ]);
    let engine = PartitionProjection::new(spec, &ProjectionConfig::default());
    let names = list(&engine, &PartitionFilter::all()).unwrap();
    assert_eq!(names.len(), 9);
    assert_eq!(&names[..4], &["a=1/b=x", "a=1/b=y", "a=1/b=z", "a=2/b=x"]);
    assert_eq!(names[8], "a=3/b=z");
}

#[test]
fn limit_exceeded_returns_no_partial_result() {
    let spec = spec(vec![
        enum_column("a", &["1", "2", "3"]),
        enum_column("b", &["x", "y", "z"]),
    ]);
    let engine = PartitionProjection::new(spec, &config_with_limit(5));
    assert_limit_exceeded(&list(&engine, &PartitionFilter::all()), 5);

    let narrowed = PartitionFilter::all().with("a", Predicate::eq("1"));
    assert_eq!(list(&engine, &narrowed).unwrap().len(), 3);
}

#[test]
fn empty_column_empties_whole_listing() {
    let spec = spec(vec![
        integer_column("n", IntegerRange::new(0, i64::MAX)),
        enum_column("kind", &["a", "b"]),
    ]);
    let engine = PartitionProjection::new(spec, &config_with_limit(10));
    let filter = PartitionFilter::all().with("kind", Predicate::eq("missing"));
    assert_eq!(list(&engine, &filter).unwrap(), Vec::<String>::new());
}

#[test]
fn repeated_listing_is_identical() {
    let engine = PartitionProjection::new(
        ProjectionSpec::from_table(&projected_table()).unwrap().unwrap(),
        &ProjectionConfig::default(),
    );
    let ctx = EvaluationContext::new();
    let columns = engine.spec().column_names();
    let first = engine
        .list_partition_names(&columns, &PartitionFilter::all(), &ctx)
        .unwrap();
    let second = engine
        .list_partition_names(&columns, &PartitionFilter::all(), &ctx)
        .unwrap();
    assert_eq!(first.len(), 3 * 6 * 3);
    assert_eq!(first, second);
}

#[test]
fn now_bound_is_fixed_by_context() {
    let table = Table::new("web", "recent", "s3://bucket/recent")
        .with_partition_column("dt", ColumnType::Varchar)
        .with_parameter(PROJECTION_ENABLED, "true")
        .with_parameter("projection.dt.type", "date")
        .with_parameter("projection.dt.format", "yyyy-MM-dd")
        .with_parameter("projection.dt.range", "NOW-1DAYS,NOW");
    let engine = PartitionProjection::new(
        ProjectionSpec::from_table(&table).unwrap().unwrap(),
        &ProjectionConfig::default(),
    );
    let ctx = EvaluationContext::at(midnight(2024, 2, 29));
    let names = engine
        .list_partition_names(&["dt".to_string()], &PartitionFilter::all(), &ctx)
        .unwrap();
    assert_eq!(names, vec!["dt=2024-02-28", "dt=2024-02-29"]);

    let partition = engine.materialize(&table, "dt=2024-02-28", &ctx).unwrap();
    assert_eq!(partition.location, "s3://bucket/recent/dt=2024-02-28");
    assert_out_of_domain(&engine.materialize(&table, "dt=2024-03-01", &ctx), "dt");
}

#[test]
fn materialize_rejects_bad_names() {
    let table = projected_table();
    let engine = PartitionProjection::new(
        ProjectionSpec::from_table(&table).unwrap().unwrap(),
        &ProjectionConfig::default(),
    );
    let ctx = EvaluationContext::new();
    assert_invalid_partition_name(&engine.materialize(&table, "region=us-east", &ctx));
    assert_invalid_partition_name(
        &engine.materialize(&table, "dt=2020-01-01/id=02/region=us-east", &ctx),
    );
    assert_out_of_domain(
        &engine.materialize(&table, "region=us-west/id=02/dt=2020-01-01", &ctx),
        "region",
    );
    assert_out_of_domain(
        &engine.materialize(&table, "region=us-east/id=2/dt=2020-01-01", &ctx),
        "id",
    );
    assert_out_of_domain(
        &engine.materialize(&table, "region=us-east/id=02/dt=2020-01-04", &ctx),
        "dt",
    );
}

#[test]
fn injected_location_uses_template() {
    let table = injected_table();
    let engine = PartitionProjection::new(
        ProjectionSpec::from_table(&table).unwrap().unwrap(),
        &ProjectionConfig::default(),
    );
    let partition = engine
        .materialize(&table, "tenant=acme", &EvaluationContext::new())
        .unwrap();
    assert_eq!(partition.location, "s3://bucket/tenants/acme/");
    assert_eq!(partition.values, vec![("tenant".to_string(), "acme".to_string())]);
}
