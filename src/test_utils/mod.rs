//! Test doubles for exercising the engine without a real database.
//!
//! Enabled for this crate's own tests and, through the `test-utils` feature, for integration
//! tests and downstream crates.

pub mod mock;
pub mod test_helpers;

pub use mock::{MockConnection, MockDriver, MockStatement, RecordingSleeper};
pub use test_helpers::{create_test_row, mock_engine};
