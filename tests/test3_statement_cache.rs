use std::sync::Arc;

use resilient_sql::prelude::*;
use resilient_sql::test_utils::{MockDriver, mock_engine};

#[test]
fn identical_text_reuses_statement() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new();
    let (mut engine, _) = mock_engine(&driver, RetryPolicy::default());

    engine
        .prepare("SELECT * FROM t WHERE id IN (:ids)")
        .execute(&NamedParams::new().bind_list("ids", [1_i64, 2]))?;
    let first = Arc::clone(engine.active_statement().ok_or("no statement")?);

    // Same list length means the same rewritten text.
    engine
        .prepare("SELECT * FROM t WHERE id IN (:ids)")
        .execute(&NamedParams::new().bind_list("ids", [7_i64, 8]))?;
    let second = Arc::clone(engine.active_statement().ok_or("no statement")?);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(driver.prepare_count(), 1);
    assert_eq!(engine.cached_statements(), 1);

    // A different length is a different statement.
    engine
        .prepare("SELECT * FROM t WHERE id IN (:ids)")
        .execute(&NamedParams::new().bind_list("ids", [1_i64, 2, 3]))?;
    assert_eq!(driver.prepare_count(), 2);
    assert_eq!(engine.cached_statements(), 2);
    Ok(())
}

#[test]
fn reconnect_forces_fresh_statement() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new();
    let (mut engine, _) = mock_engine(&driver, RetryPolicy::default());

    engine.prepare("SELECT 1").execute(&NamedParams::new())?;
    let before = Arc::clone(engine.active_statement().ok_or("no statement")?);
    engine.prepare("SELECT 2").execute(&NamedParams::new())?;
    assert_eq!(engine.cached_statements(), 2);

    driver.sever_connections();
    engine.prepare("SELECT 1").execute(&NamedParams::new())?;
    let after = Arc::clone(engine.active_statement().ok_or("no statement")?);

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.key(), after.key());
    assert_eq!(before.handle().connection_id(), 1);
    assert_eq!(after.handle().connection_id(), 2);
    // Only the re-prepared statement survives the reconnect.
    assert_eq!(engine.cached_statements(), 1);
    Ok(())
}

#[test]
fn statement_key_is_sha256_of_text() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new();
    let (mut engine, _) = mock_engine(&driver, RetryPolicy::default());
    engine.prepare("SELECT 1").execute(&NamedParams::new())?;

    let stmt = engine.active_statement().ok_or("no statement")?;
    assert_eq!(
        stmt.key().as_str(),
        "e004ebd5b5532a4b85984a62f8ad48a81aa3460c1ca07701f386135d72cdecf5"
    );
    assert_eq!(stmt.sql(), "SELECT 1");
    Ok(())
}
