//! Backend interface consumed by the engine.
//!
//! A [`Driver`] opens connections; a [`DriverConnection`] prepares and runs statements. The
//! engine never interpolates values into SQL it executes: parameters always reach the driver
//! through [`BoundParams`].

use crate::config::Credentials;
use crate::error::SqlResilientError;
use crate::query_utils::quote_literal;
use crate::results::ResultSet;
use crate::types::{BoundParams, RowValues};

pub trait Driver {
    type Connection: DriverConnection;

    /// Open a new connection.
    ///
    /// # Errors
    /// Returns [`SqlResilientError`] if the database cannot be reached or rejects the credentials.
    fn connect(&self, credentials: &Credentials) -> Result<Self::Connection, SqlResilientError>;

    /// Render `value` as a SQL literal. Used only for diagnostics and profiling.
    fn quote(&self, value: &RowValues) -> String {
        quote_literal(value)
    }

    /// Query returning one table name per row in its first column.
    fn list_tables_sql(&self) -> &'static str {
        "SELECT table_name FROM information_schema.tables ORDER BY table_name"
    }
}

pub trait DriverConnection {
    /// Opaque prepared-statement handle, valid only for the connection that produced it.
    type Statement;

    /// Prepare `sql` for execution.
    ///
    /// # Errors
    /// Returns [`SqlResilientError`] if the statement cannot be parsed or the link is down.
    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, SqlResilientError>;

    /// Execute a prepared statement and fetch every resulting row.
    ///
    /// `rows_affected` on the returned set is the changed-row count for DML, or the number of
    /// rows returned for queries.
    ///
    /// # Errors
    /// Returns [`SqlResilientError`] if binding or execution fails.
    fn execute(
        &mut self,
        statement: &Self::Statement,
        params: &BoundParams,
    ) -> Result<ResultSet, SqlResilientError>;

    /// Cheap round trip used to tell a dead link from a bad query.
    ///
    /// # Errors
    /// Returns [`SqlResilientError`] if the round trip fails.
    fn ping(&mut self) -> Result<(), SqlResilientError> {
        let statement = self.prepare("SELECT 1")?;
        self.execute(&statement, &BoundParams::new()).map(|_| ())
    }

    /// # Errors
    /// Returns [`SqlResilientError`] if the native begin fails.
    fn begin_transaction(&mut self) -> Result<(), SqlResilientError>;

    /// # Errors
    /// Returns [`SqlResilientError`] if the native commit fails.
    fn commit(&mut self) -> Result<(), SqlResilientError>;

    /// # Errors
    /// Returns [`SqlResilientError`] if the native rollback fails.
    fn rollback(&mut self) -> Result<(), SqlResilientError>;

    /// # Errors
    /// Returns [`SqlResilientError`] if the backend cannot report an id.
    fn last_insert_id(&mut self) -> Result<i64, SqlResilientError>;
}
