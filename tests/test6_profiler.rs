use std::sync::Arc;
use std::time::Duration;

use resilient_sql::prelude::*;
use resilient_sql::profiler::{ProfilerSink, QueryKind};
use resilient_sql::test_utils::{MockDriver, mock_engine};

#[test]
fn engine_reports_each_successful_execution() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new();
    let (mut engine, _) = mock_engine(&driver, RetryPolicy::default());
    let profiler = ProfilerResults::shared();
    engine.set_profiler(Arc::clone(&profiler));

    engine
        .prepare("SELECT * FROM t WHERE id IN (:ids)")
        .execute(&NamedParams::new().bind_list("ids", [1_i64, 2]))?;
    engine
        .prepare("UPDATE t SET name = :name WHERE id = :id")
        .execute(&NamedParams::new().bind("name", "x").bind("id", 1_i64))?;
    driver.fail_queries_containing("broken");
    assert!(engine.prepare("DELETE FROM broken").execute(&NamedParams::new()).is_err());

    let results = profiler.lock().map_err(|_| "poisoned")?;
    assert_eq!(results.total_queries(), 2);
    // The mock returns one row per bound value.
    assert_eq!(results.total_affected_rows(), 4);
    assert_eq!(
        results.queries()[0].query,
        "SELECT * FROM t WHERE id IN (1, 2)"
    );
    assert_eq!(
        results.queries()[1].query,
        "UPDATE t SET name = 'x' WHERE id = 1"
    );

    let breakdown = results.breakdown();
    assert_eq!(breakdown[0].0, QueryKind::Select);
    assert_eq!(breakdown[0].1.queries.len(), 1);
    assert_eq!(breakdown[1].1.total_affected_rows, 2);
    assert!(breakdown[3].1.queries.is_empty());
    Ok(())
}

#[test]
fn summary_and_table_views() {
    let mut results = ProfilerResults::new();
    results.add_query("SELECT 1", Duration::from_millis(100), 1);
    results.add_query("INSERT INTO t VALUES ('<b>')", Duration::from_millis(300), 1);

    let summary = SummaryView::new(&results)
        .with_page_generation_time(Duration::from_secs(1))
        .to_string();
    assert!(summary.contains("(40%) 0.4000 Secs Database - 2 Queries, 2 Affected Rows"));
    assert!(summary.ends_with("1 Reads, 0 Updates, 1 Inserts, 0 Deletes, 0 Other"));

    let table = ProfilerView::Table.render(&results);
    assert!(table.contains("<p style='font-weight:bold;'>INSERTS (1) - 0.300000</p>"));
    assert!(table.contains("INSERT INTO t VALUES (&#039;&lt;b&gt;&#039;)"));
    assert!(table.contains("OTHERS (0) - 0.000000"));
}

#[test]
fn profiler_can_be_supplied_through_builder() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new();
    let profiler = ProfilerResults::shared();
    let mut engine = EngineOptionsBuilder::new()
        .profiler(Arc::clone(&profiler))
        .build(driver, Credentials::new("mock://db", "", ""));

    engine.prepare("SELECT 1").execute(&NamedParams::new())?;
    assert_eq!(profiler.lock().map_err(|_| "poisoned")?.total_queries(), 1);
    assert!(engine.take_profiler().is_some());
    Ok(())
}
