//! The execution engine: one logical database connection with automatic recovery.
//!
//! `execute` runs a single attempt; if it fails and a ping shows the server is unreachable, the
//! engine walks the [`RetryPolicy`], sleeping, reconnecting, and retrying once per delay. A ping
//! that succeeds means the query itself is bad, so it is never re-issued. Irrecoverable failures
//! leave the engine [`ConnectionState::Defunct`], after which every call fails immediately.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::config::{Credentials, EngineOptions, EngineOptionsBuilder};
use crate::connection::{ConnectionManager, StatementOf};
use crate::driver::{Driver, DriverConnection};
use crate::error::SqlResilientError;
use crate::expand::expand_params;
use crate::profiler::ProfilerSink;
use crate::query_utils::materialize_query;
use crate::results::ResultSet;
use crate::retry::{RetryPolicy, Sleeper};
use crate::statement_cache::PreparedStatement;
use crate::types::{NamedParams, RowValues};

mod tx;

/// Lifecycle of the engine's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No usable handle: not yet connected, the last connect failed, or the link was found dead
    /// while a transaction blocked reconnecting.
    Unconnected,
    Connected,
    /// Waiting for or running reconnect attempt `attempt` (1-based).
    Retrying { attempt: usize },
    /// Terminal: nothing further will be attempted.
    Defunct,
}

/// Outcome of a single attempt that did not produce rows.
enum AttemptFailure {
    /// No connection could be opened.
    NotConnected(SqlResilientError),
    /// Prepare or execute failed; may be retried if the link is down.
    Failed(SqlResilientError),
    /// Never retried.
    Fatal(SqlResilientError),
}

impl AttemptFailure {
    /// Prepare and execute errors come from the server, so even a binding error goes through
    /// the ping check. Only the transaction guard short-circuits.
    fn from_driver(err: SqlResilientError) -> Self {
        match err {
            SqlResilientError::TransactionReconnect | SqlResilientError::Defunct => {
                AttemptFailure::Fatal(err)
            }
            other => AttemptFailure::Failed(other),
        }
    }
}

pub struct ExecutionEngine<D: Driver> {
    connection: ConnectionManager<D>,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper + Send>,
    profiler: Option<Box<dyn ProfilerSink + Send>>,
    pending_query: String,
    active_statement: Option<Arc<PreparedStatement<StatementOf<D>>>>,
    state: ConnectionState,
}

impl<D: Driver> ExecutionEngine<D> {
    /// Engine with the default `[0.5s, 1s, 3s]` reconnect schedule. Does not connect.
    #[must_use]
    pub fn new(driver: D, credentials: Credentials) -> Self {
        Self::with_options(driver, credentials, EngineOptions::default())
    }

    #[must_use]
    pub fn with_options(driver: D, credentials: Credentials, options: EngineOptions) -> Self {
        Self {
            connection: ConnectionManager::new(driver, credentials),
            retry: options.retry,
            sleeper: options.sleeper,
            profiler: options.profiler,
            pending_query: String::new(),
            active_statement: None,
            state: ConnectionState::Unconnected,
        }
    }

    #[must_use]
    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::new()
    }

    /// Store `sql` as the query run by the next [`execute`](Self::execute).
    pub fn prepare(&mut self, sql: impl Into<String>) -> &mut Self {
        self.pending_query = sql.into();
        self
    }

    #[must_use]
    pub fn pending_query(&self) -> &str {
        &self.pending_query
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// `true` once the engine has failed irrecoverably. Check this from cleanup code before
    /// touching the database.
    #[must_use]
    pub fn is_defunct(&self) -> bool {
        self.state == ConnectionState::Defunct
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    #[must_use]
    pub fn connection(&self) -> &ConnectionManager<D> {
        &self.connection
    }

    /// Statement used by the most recent execution.
    #[must_use]
    pub fn active_statement(&self) -> Option<&Arc<PreparedStatement<StatementOf<D>>>> {
        self.active_statement.as_ref()
    }

    #[must_use]
    pub fn cached_statements(&self) -> usize {
        self.connection.statements().len()
    }

    pub fn set_profiler(&mut self, profiler: impl ProfilerSink + Send + 'static) {
        self.profiler = Some(Box::new(profiler));
    }

    pub fn take_profiler(&mut self) -> Option<Box<dyn ProfilerSink + Send>> {
        self.profiler.take()
    }

    /// Close the connection and drop cached statements. The next call reconnects lazily.
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
        self.active_statement = None;
        if !self.is_defunct() {
            self.state = ConnectionState::Unconnected;
        }
    }

    /// Run the pending query, reconnecting per the retry policy if the server went away.
    ///
    /// # Errors
    /// - [`SqlResilientError::Defunct`] immediately if the engine already failed.
    /// - [`SqlResilientError::ParamCollision`] if list expansion clashes; the engine becomes
    ///   defunct.
    /// - [`SqlResilientError::TransactionReconnect`] if the link dropped mid-transaction.
    /// - [`SqlResilientError::QueryExecution`] if the query failed while the server was
    ///   reachable; the engine becomes defunct.
    /// - [`SqlResilientError::RetriesExhausted`] if every reconnect attempt failed; the engine
    ///   becomes defunct.
    pub fn execute(&mut self, params: &NamedParams) -> Result<ResultSet, SqlResilientError> {
        if self.is_defunct() {
            return Err(SqlResilientError::Defunct);
        }
        let sql = self.take_query()?;

        let mut failure = match self.attempt(&sql, params) {
            Ok(results) => return Ok(results),
            Err(failure) => failure,
        };

        // A refused connect followed by a healthy ping means the server came back; try once more
        // on the handle the ping opened before judging the query.
        if let AttemptFailure::NotConnected(_) = failure {
            if self.connection.ping() {
                failure = match self.attempt(&sql, params) {
                    Ok(results) => return Ok(results),
                    Err(failure) => failure,
                };
            }
        }

        let last_error = match failure {
            AttemptFailure::Fatal(err) => return Err(self.fail_fatal(err)),
            AttemptFailure::NotConnected(err) => err,
            AttemptFailure::Failed(err) => {
                if self.connection.ping() {
                    return Err(self.fail_query(&sql, params, &err));
                }
                err
            }
        };

        self.retry_after_disconnect(&sql, params, last_error)
    }

    /// Run the pending query exactly once: no ping, no reconnect, and a plain failure does not
    /// make the engine defunct.
    ///
    /// # Errors
    /// Returns the connect, prepare, or execution error as-is; fatal errors behave as in
    /// [`execute`](Self::execute).
    pub fn execute_once(&mut self, params: &NamedParams) -> Result<ResultSet, SqlResilientError> {
        if self.is_defunct() {
            return Err(SqlResilientError::Defunct);
        }
        let sql = self.take_query()?;
        match self.attempt(&sql, params) {
            Ok(results) => Ok(results),
            Err(AttemptFailure::Fatal(err)) => Err(self.fail_fatal(err)),
            Err(AttemptFailure::NotConnected(err) | AttemptFailure::Failed(err)) => Err(err),
        }
    }

    /// Render `sql` with every placeholder replaced by the driver's quoted literal.
    ///
    /// For logs and diagnostics only; nothing is connected or executed.
    #[must_use]
    pub fn simulate_executed_query(&self, sql: &str, params: &NamedParams) -> String {
        let driver = self.connection.driver();
        materialize_query(sql, params, |value| driver.quote(value))
    }

    /// Row id of the last insert on the current connection.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Defunct`] or [`SqlResilientError::Connection`] if there is no
    /// live connection, or the driver's error.
    pub fn last_insert_id(&mut self) -> Result<i64, SqlResilientError> {
        if self.is_defunct() {
            return Err(SqlResilientError::Defunct);
        }
        self.connection.connection_mut()?.last_insert_id()
    }

    /// Names of every table visible to the connection.
    ///
    /// Replaces the pending query.
    ///
    /// # Errors
    /// Same as [`execute`](Self::execute).
    pub fn all_tables(&mut self) -> Result<Vec<String>, SqlResilientError> {
        let sql = self.connection.driver().list_tables_sql();
        let results = self.prepare(sql).execute(&NamedParams::new())?;
        Ok(results
            .rows()
            .iter()
            .filter_map(|row| row.get_by_index(0))
            .filter_map(RowValues::as_text)
            .map(str::to_owned)
            .collect())
    }

    fn take_query(&self) -> Result<String, SqlResilientError> {
        if self.pending_query.trim().is_empty() {
            return Err(SqlResilientError::Parameter(
                "no query has been prepared".into(),
            ));
        }
        Ok(self.pending_query.clone())
    }

    fn attempt(&mut self, sql: &str, params: &NamedParams) -> Result<ResultSet, AttemptFailure> {
        if let Err(err) = self.connection.connect() {
            self.state = ConnectionState::Unconnected;
            return Err(if err.is_fatal() {
                AttemptFailure::Fatal(err)
            } else {
                AttemptFailure::NotConnected(err)
            });
        }
        self.state = ConnectionState::Connected;

        let expanded = expand_params(sql, params).map_err(AttemptFailure::Fatal)?;
        let statement = self
            .connection
            .prepare(&expanded.sql)
            .map_err(AttemptFailure::from_driver)?;
        self.active_statement = Some(Arc::clone(&statement));

        let started = Instant::now();
        let results = self
            .connection
            .execute(&statement, &expanded.params)
            .map_err(AttemptFailure::from_driver)?;
        let elapsed = started.elapsed();

        debug!(
            key = %statement.key(),
            elapsed_us = elapsed.as_micros() as u64,
            rows = results.rows_affected,
            "executed"
        );
        if self.profiler.is_some() {
            let rendered = self.simulate_executed_query(sql, params);
            if let Some(profiler) = self.profiler.as_mut() {
                profiler.add_query(&rendered, elapsed, results.rows_affected);
            }
        }
        Ok(results)
    }

    fn retry_after_disconnect(
        &mut self,
        sql: &str,
        params: &NamedParams,
        first_error: SqlResilientError,
    ) -> Result<ResultSet, SqlResilientError> {
        let delays: Vec<_> = self.retry.iter().collect();
        let total = delays.len();
        let mut last_error = first_error;

        for (index, delay) in delays.into_iter().enumerate() {
            let attempt = index + 1;
            if let Err(err) = self.connection.ensure_reconnect_allowed() {
                self.state = ConnectionState::Unconnected;
                return Err(err);
            }
            self.state = ConnectionState::Retrying { attempt };
            warn!(
                attempt,
                of = total,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "database unreachable; reconnecting"
            );
            self.sleeper.sleep(delay);
            self.active_statement = None;

            match self.connection.reconnect() {
                Ok(()) => match self.attempt(sql, params) {
                    Ok(results) => return Ok(results),
                    Err(AttemptFailure::Fatal(err)) => return Err(self.fail_fatal(err)),
                    Err(AttemptFailure::NotConnected(err) | AttemptFailure::Failed(err)) => {
                        last_error = err;
                    }
                },
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    self.state = ConnectionState::Unconnected;
                    last_error = err;
                }
            }
        }

        let err = SqlResilientError::RetriesExhausted {
            attempts: total,
            query: self.simulate_executed_query(sql, params),
            source: Box::new(last_error),
        };
        self.mark_defunct(&err);
        Err(err)
    }

    /// The server answered a ping, so the failure lies with the query itself.
    fn fail_query(
        &mut self,
        sql: &str,
        params: &NamedParams,
        cause: &SqlResilientError,
    ) -> SqlResilientError {
        let err =
            SqlResilientError::query_failed(cause, self.simulate_executed_query(sql, params));
        self.mark_defunct(&err);
        err
    }

    fn fail_fatal(&mut self, err: SqlResilientError) -> SqlResilientError {
        if matches!(err, SqlResilientError::ParamCollision { .. }) {
            self.mark_defunct(&err);
        }
        err
    }

    fn mark_defunct(&mut self, cause: &SqlResilientError) {
        error!(error = %cause, "engine is now defunct");
        self.state = ConnectionState::Defunct;
    }
}

impl<D: Driver> fmt::Debug for ExecutionEngine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("connection", &self.connection)
            .field("retry", &self.retry)
            .field("state", &self.state)
            .field("pending_query", &self.pending_query)
            .finish_non_exhaustive()
    }
}
