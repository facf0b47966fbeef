//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{Credentials, EngineConfig, EngineOptionsBuilder};
pub use crate::engine::{ConnectionState, ExecutionEngine};
pub use crate::error::SqlResilientError;
pub use crate::profiler::{ProfilerResults, ProfilerView, SummaryView, TableView};
pub use crate::registry::{ConnectionRegistry, DEFAULT_CONNECTION_NAME};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::retry::RetryPolicy;
pub use crate::types::{NamedParams, ParamValue, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteDriver, SqliteOptionsBuilder};
