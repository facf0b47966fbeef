use chrono::NaiveDate;
use resilient_sql::prelude::*;
use resilient_sql::test_utils::{MockDriver, mock_engine};

#[test]
fn simulate_quotes_every_value_without_touching_state() {
    let driver = MockDriver::new();
    let (mut engine, _) = mock_engine(&driver, RetryPolicy::default());
    engine.prepare("SELECT 'pending'");

    let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
        .and_then(|d| d.and_hms_opt(7, 8, 9))
        .expect("valid timestamp");
    let params = NamedParams::new()
        .bind("name", "it's")
        .bind("n", 3_i64)
        .bind("flag", true)
        .bind("at", ts)
        .bind("nothing", RowValues::Null)
        .bind_list("ids", [4_i64, 5]);

    let rendered = engine.simulate_executed_query(
        "SELECT * FROM t WHERE name = :name AND n = :n AND flag = :flag AND at = :at \
         AND x IS :nothing AND id IN (:ids) AND note = ':name'",
        &params,
    );
    assert_eq!(
        rendered,
        "SELECT * FROM t WHERE name = 'it''s' AND n = 3 AND flag = 1 AND at = '2024-05-06 07:08:09' \
         AND x IS NULL AND id IN (4, 5) AND note = ':name'"
    );

    assert_eq!(driver.connect_attempts(), 0);
    assert!(driver.executed().is_empty());
    assert_eq!(engine.state(), ConnectionState::Unconnected);
    assert_eq!(engine.pending_query(), "SELECT 'pending'");
    assert_eq!(engine.cached_statements(), 0);
}

#[test]
fn simulate_leaves_unknown_placeholders() {
    let driver = MockDriver::new();
    let (engine, _) = mock_engine(&driver, RetryPolicy::default());
    assert_eq!(
        engine.simulate_executed_query(
            "SELECT :a, :b::text",
            &NamedParams::new().bind("b", "v")
        ),
        "SELECT :a, 'v'::text"
    );
}

#[test]
fn all_tables_through_mock() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new();
    driver.set_tables(["accounts", "orders"]);
    let (mut engine, _) = mock_engine(&driver, RetryPolicy::default());
    assert_eq!(engine.all_tables()?, vec!["accounts", "orders"]);
    Ok(())
}
