//! Resilient synchronous SQL execution.
//!
//! An [`ExecutionEngine`] wraps one logical database connection. It connects lazily, caches
//! prepared statements per connection, expands list-valued named parameters into individual
//! placeholders, and transparently reconnects on a fixed delay schedule when the server goes
//! away. Inside a transaction it refuses to reconnect, and once recovery has failed it turns
//! defunct so callers can skip further database work.
//!
//! ```rust
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), resilient_sql::SqlResilientError> {
//! use resilient_sql::prelude::*;
//!
//! let mut db = ExecutionEngine::new(SqliteDriver::new(), Credentials::new(":memory:", "", ""));
//! db.prepare("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
//!     .execute(&NamedParams::new())?;
//! for name in ["ada", "grace", "linus"] {
//!     db.prepare("INSERT INTO users (name) VALUES (:name)")
//!         .execute(&NamedParams::new().bind("name", name))?;
//! }
//!
//! let rows = db
//!     .prepare("SELECT name FROM users WHERE id IN (:ids) ORDER BY id")
//!     .execute(&NamedParams::new().bind_list("ids", [1_i64, 3]))?;
//! assert_eq!(rows.len(), 2);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```

pub mod config;
pub mod connection;
pub mod driver;
pub mod engine;
pub mod error;
pub mod expand;
pub mod placeholders;
pub mod prelude;
pub mod profiler;
pub mod query_utils;
pub mod registry;
pub mod results;
pub mod retry;
pub mod statement_cache;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{Credentials, EngineConfig, EngineOptions, EngineOptionsBuilder};
pub use connection::ConnectionManager;
pub use driver::{Driver, DriverConnection};
pub use engine::{ConnectionState, ExecutionEngine};
pub use error::SqlResilientError;
pub use expand::{EXPANDED_PARAM_PREFIX, ExpandedQuery, expand_params};
pub use profiler::{ProfilerResults, ProfilerSink, ProfilerView, QueryKind};
pub use registry::{ConnectionRegistry, DEFAULT_CONNECTION_NAME};
pub use results::{CustomDbRow, ResultSet};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use statement_cache::{PreparedStatement, StatementCache, StatementKey};
pub use types::{BoundParams, NamedParams, ParamValue, RowValues};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDriver, SqliteOptions, SqliteOptionsBuilder};
