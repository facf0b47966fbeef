//! `SQLite` backend on `rusqlite`.
//!
//! - config: `SqliteOptions`, its builder, and the `Driver` that opens connections
//! - connection: statement preparation, binding, and transactions
//! - params: `RowValues` to `rusqlite` value conversion
//! - query: result extraction

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{SqliteDriver, SqliteOptions, SqliteOptionsBuilder};
pub use connection::{SqliteConnection, SqliteStatement};
pub use query::build_result_set;
