//! Helper utilities for testing and development.

use std::sync::Arc;

use super::mock::{MockDriver, RecordingSleeper};
use crate::config::{Credentials, EngineOptionsBuilder};
use crate::engine::ExecutionEngine;
use crate::results::CustomDbRow;
use crate::retry::RetryPolicy;
use crate::types::RowValues;

/// Create a test row with the given column names and values.
#[must_use]
pub fn create_test_row(column_names: Vec<String>, values: Vec<RowValues>) -> CustomDbRow {
    CustomDbRow::new(Arc::new(column_names), values)
}

/// An engine over `driver` whose reconnect delays are recorded instead of slept.
#[must_use]
pub fn mock_engine(
    driver: &MockDriver,
    retry: RetryPolicy,
) -> (ExecutionEngine<MockDriver>, RecordingSleeper) {
    let sleeper = RecordingSleeper::new();
    let engine = EngineOptionsBuilder::new()
        .retry(retry)
        .sleeper(sleeper.clone())
        .build(driver.clone(), Credentials::new("mock://db", "app", "secret"));
    (engine, sleeper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NamedParams;

    #[test]
    fn test_row_resolves_columns() {
        let row = create_test_row(
            vec!["id".into(), "name".into()],
            vec![RowValues::Int(1), RowValues::Text("a".into())],
        );
        assert_eq!(row.get("name"), Some(&RowValues::Text("a".into())));
        assert_eq!(row.get_by_index(0), Some(&RowValues::Int(1)));
    }

    #[test]
    fn mock_engine_records_instead_of_sleeping() {
        let driver = MockDriver::new();
        let (mut engine, sleeper) = mock_engine(&driver, RetryPolicy::default());
        driver.fail_next_connects(2);
        assert!(engine.prepare("SELECT 1").execute(&NamedParams::new()).is_ok());
        assert_eq!(sleeper.slept().len(), 1);
    }
}
