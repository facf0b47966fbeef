use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Credentials;
use crate::driver::{Driver, DriverConnection};
use crate::error::SqlResilientError;
use crate::results::ResultSet;
use crate::statement_cache::{PreparedStatement, StatementCache};
use crate::types::BoundParams;

/// Statement handle type produced by driver `D`.
pub type StatementOf<D> = <<D as Driver>::Connection as DriverConnection>::Statement;

/// Owns the lazily opened driver connection and the statements prepared on it.
///
/// The statement cache lives next to the handle so both are always replaced together.
pub struct ConnectionManager<D: Driver> {
    driver: D,
    credentials: Credentials,
    handle: Option<D::Connection>,
    statements: StatementCache<StatementOf<D>>,
    in_transaction: bool,
    connections_opened: u64,
}

impl<D: Driver> ConnectionManager<D> {
    #[must_use]
    pub fn new(driver: D, credentials: Credentials) -> Self {
        Self {
            driver,
            credentials,
            handle: None,
            statements: StatementCache::new(),
            in_transaction: false,
            connections_opened: 0,
        }
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub(crate) fn set_in_transaction(&mut self, active: bool) {
        self.in_transaction = active;
    }

    /// Number of connections successfully opened over this manager's lifetime.
    #[must_use]
    pub fn connections_opened(&self) -> u64 {
        self.connections_opened
    }

    #[must_use]
    pub fn statements(&self) -> &StatementCache<StatementOf<D>> {
        &self.statements
    }

    pub(crate) fn ensure_reconnect_allowed(&self) -> Result<(), SqlResilientError> {
        if self.in_transaction {
            Err(SqlResilientError::TransactionReconnect)
        } else {
            Ok(())
        }
    }

    /// Open a connection unless one is already held.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::TransactionReconnect`] without touching the driver if a
    /// transaction is active, or [`SqlResilientError::Connection`] if the driver fails.
    pub fn connect(&mut self) -> Result<(), SqlResilientError> {
        if self.handle.is_some() {
            return Ok(());
        }
        self.ensure_reconnect_allowed()?;

        match self.driver.connect(&self.credentials) {
            Ok(conn) => {
                self.connections_opened += 1;
                debug!(
                    dsn = self.credentials.dsn(),
                    opened = self.connections_opened,
                    "connected"
                );
                self.handle = Some(conn);
                Ok(())
            }
            Err(err) => {
                self.handle = None;
                Err(match err {
                    SqlResilientError::Connection(msg) => SqlResilientError::Connection(msg),
                    other => SqlResilientError::Connection(format!(
                        "failed to connect to {}: {other}",
                        self.credentials.dsn()
                    )),
                })
            }
        }
    }

    /// `true` if a round trip to the server succeeds. Never returns an error.
    pub fn ping(&mut self) -> bool {
        if let Err(err) = self.connect() {
            warn!(error = %err, "ping could not connect");
            return false;
        }
        let Some(conn) = self.handle.as_mut() else {
            return false;
        };
        match conn.ping() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "ping failed");
                false
            }
        }
    }

    /// Drop the handle and every cached statement, then connect again.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::TransactionReconnect`] and keeps the current handle if a
    /// transaction is active; otherwise propagates [`ConnectionManager::connect`] errors.
    pub fn reconnect(&mut self) -> Result<(), SqlResilientError> {
        self.ensure_reconnect_allowed()?;
        self.drop_handle();
        self.connect()
    }

    /// Drop the handle and cache. An open transaction is abandoned.
    pub fn disconnect(&mut self) {
        if self.in_transaction {
            warn!("disconnecting with an open transaction; uncommitted work is discarded");
            self.in_transaction = false;
        }
        self.drop_handle();
    }

    fn drop_handle(&mut self) {
        self.statements.clear();
        self.handle = None;
    }

    /// Borrow the live connection.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Connection`] if no connection is open.
    pub fn connection_mut(&mut self) -> Result<&mut D::Connection, SqlResilientError> {
        self.handle
            .as_mut()
            .ok_or_else(|| SqlResilientError::Connection("not connected".into()))
    }

    pub(crate) fn prepare(
        &mut self,
        sql: &str,
    ) -> Result<Arc<PreparedStatement<StatementOf<D>>>, SqlResilientError> {
        let conn = self
            .handle
            .as_mut()
            .ok_or_else(|| SqlResilientError::Connection("not connected".into()))?;
        self.statements.get_or_prepare(conn, sql)
    }

    pub(crate) fn execute(
        &mut self,
        statement: &PreparedStatement<StatementOf<D>>,
        params: &BoundParams,
    ) -> Result<ResultSet, SqlResilientError> {
        self.connection_mut()?.execute(statement.handle(), params)
    }
}

impl<D: Driver> fmt::Debug for ConnectionManager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("credentials", &self.credentials)
            .field("connected", &self.handle.is_some())
            .field("cached_statements", &self.statements.len())
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}
