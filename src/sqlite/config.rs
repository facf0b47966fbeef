use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use super::connection::SqliteConnection;
use crate::config::Credentials;
use crate::driver::Driver;
use crate::error::SqlResilientError;

/// Options applied to every `SQLite` connection a [`SqliteDriver`] opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    pub busy_timeout: Duration,
    /// Switch the database to WAL journaling on connect. Ignored for read-only connections.
    pub wal: bool,
    pub read_only: bool,
    /// Capacity of `rusqlite`'s per-connection prepared statement cache.
    pub statement_cache_capacity: usize,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            wal: true,
            read_only: false,
            statement_cache_capacity: 64,
        }
    }
}

impl SqliteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn open_flags(&self) -> OpenFlags {
        if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        }
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone, Default)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.opts.read_only = read_only;
        self
    }

    #[must_use]
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.opts.statement_cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    #[must_use]
    pub fn build(self) -> SqliteDriver {
        SqliteDriver::with_options(self.finish())
    }
}

/// Opens `rusqlite` connections. The credentials' dsn is a file path, `:memory:`, or a `file:`
/// URI; username and secret are ignored.
#[derive(Debug, Clone, Default)]
pub struct SqliteDriver {
    options: SqliteOptions,
}

impl SqliteDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: SqliteOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn builder() -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new()
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.options
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    fn connect(&self, credentials: &Credentials) -> Result<SqliteConnection, SqlResilientError> {
        let conn = Connection::open_with_flags(credentials.dsn(), self.options.open_flags())
            .map_err(|e| {
                SqlResilientError::Connection(format!(
                    "failed to open SQLite database {}: {e}",
                    credentials.dsn()
                ))
            })?;
        conn.busy_timeout(self.options.busy_timeout)?;
        if self.options.wal && !self.options.read_only {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.set_prepared_statement_cache_capacity(self.options.statement_cache_capacity);
        debug!(path = credentials.dsn(), "opened sqlite connection");
        Ok(SqliteConnection::new(conn))
    }

    fn list_tables_sql(&self) -> &'static str {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
    }
}
