use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::Credentials;
use crate::driver::{Driver, DriverConnection};
use crate::error::SqlResilientError;
use crate::results::ResultSet;
use crate::retry::Sleeper;
use crate::types::{BoundParams, RowValues};

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    /// Connections with an id at or below this are dead.
    severed_through: u64,
    server_down: bool,
    failing_connects: usize,
    failing_commits: usize,
    fail_patterns: Vec<String>,
    tables: Vec<String>,
    connect_attempts: usize,
    prepare_count: usize,
    ping_count: usize,
    executed: Vec<String>,
    last_insert_id: i64,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Scriptable in-process driver.
///
/// Clones share state, so a test keeps one clone to script failures and read counters while
/// the engine owns another.
///
/// Each result set has columns `name` and `value` with one row per bound parameter, which lets
/// tests see exactly what reached the driver.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill every connection opened so far. New connections work normally.
    pub fn sever_connections(&self) {
        let mut state = lock(&self.state);
        state.severed_through = state.next_id;
    }

    /// Refuse every connect (and kill open connections) until set back to `false`.
    pub fn set_server_down(&self, down: bool) {
        let mut state = lock(&self.state);
        state.server_down = down;
        if down {
            state.severed_through = state.next_id;
        }
    }

    pub fn fail_next_connects(&self, count: usize) {
        lock(&self.state).failing_connects = count;
    }

    /// Fail any execution whose SQL contains `pattern`, while the link stays healthy.
    pub fn fail_queries_containing(&self, pattern: impl Into<String>) {
        lock(&self.state).fail_patterns.push(pattern.into());
    }

    pub fn fail_next_commit(&self) {
        lock(&self.state).failing_commits = 1;
    }

    /// Rows returned for the default table listing query.
    pub fn set_tables<I, S>(&self, tables: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.state).tables = tables.into_iter().map(Into::into).collect();
    }

    #[must_use]
    pub fn connect_attempts(&self) -> usize {
        lock(&self.state).connect_attempts
    }

    #[must_use]
    pub fn connections_opened(&self) -> u64 {
        lock(&self.state).next_id
    }

    #[must_use]
    pub fn prepare_count(&self) -> usize {
        lock(&self.state).prepare_count
    }

    #[must_use]
    pub fn ping_count(&self) -> usize {
        lock(&self.state).ping_count
    }

    /// SQL of every successful execution, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        lock(&self.state).executed.clone()
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;

    fn connect(&self, credentials: &Credentials) -> Result<MockConnection, SqlResilientError> {
        let mut state = lock(&self.state);
        state.connect_attempts += 1;
        if state.server_down {
            return Err(SqlResilientError::Connection(format!(
                "{} is unreachable",
                credentials.dsn()
            )));
        }
        if state.failing_connects > 0 {
            state.failing_connects -= 1;
            return Err(SqlResilientError::Connection(format!(
                "{} refused the connection",
                credentials.dsn()
            )));
        }
        state.next_id += 1;
        Ok(MockConnection {
            id: state.next_id,
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct MockConnection {
    id: u64,
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockStatement {
    connection_id: u64,
    sql: String,
}

impl MockStatement {
    #[must_use]
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl MockConnection {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    fn live_state(&self) -> Result<MutexGuard<'_, MockState>, SqlResilientError> {
        let state = lock(&self.state);
        if self.id <= state.severed_through {
            return Err(SqlResilientError::Connection(format!(
                "connection {} has gone away",
                self.id
            )));
        }
        Ok(state)
    }
}

impl DriverConnection for MockConnection {
    type Statement = MockStatement;

    fn prepare(&mut self, sql: &str) -> Result<MockStatement, SqlResilientError> {
        let mut state = self.live_state()?;
        state.prepare_count += 1;
        Ok(MockStatement {
            connection_id: self.id,
            sql: sql.to_owned(),
        })
    }

    fn execute(
        &mut self,
        statement: &MockStatement,
        params: &BoundParams,
    ) -> Result<ResultSet, SqlResilientError> {
        let mut state = self.live_state()?;
        if statement.connection_id != self.id {
            return Err(SqlResilientError::Connection(format!(
                "statement prepared on connection {} used on connection {}",
                statement.connection_id, self.id
            )));
        }
        if let Some(pattern) = state
            .fail_patterns
            .iter()
            .find(|pattern| statement.sql.contains(pattern.as_str()))
        {
            return Err(SqlResilientError::QueryExecution {
                message: format!("mock rejected statement containing `{pattern}`"),
                query: statement.sql.clone(),
            });
        }
        state.executed.push(statement.sql.clone());

        if statement.sql.contains("information_schema.tables") {
            let mut rs = ResultSet::with_capacity(state.tables.len());
            rs.set_column_names(Arc::new(vec!["table_name".to_string()]));
            for table in &state.tables {
                rs.add_row_values(vec![RowValues::Text(table.clone())]);
            }
            return Ok(rs);
        }

        if statement.sql.trim_start().to_ascii_uppercase().starts_with("INSERT") {
            state.last_insert_id += 1;
        }

        let mut rs = ResultSet::with_capacity(params.len());
        rs.set_column_names(Arc::new(vec!["name".to_string(), "value".to_string()]));
        for (name, value) in params {
            rs.add_row_values(vec![RowValues::Text(name.clone()), value.clone()]);
        }
        Ok(rs)
    }

    fn ping(&mut self) -> Result<(), SqlResilientError> {
        lock(&self.state).ping_count += 1;
        self.live_state().map(|_| ())
    }

    fn begin_transaction(&mut self) -> Result<(), SqlResilientError> {
        self.live_state().map(|_| ())
    }

    fn commit(&mut self) -> Result<(), SqlResilientError> {
        let mut state = self.live_state()?;
        if state.failing_commits > 0 {
            state.failing_commits -= 1;
            return Err(SqlResilientError::QueryExecution {
                message: "mock commit failure".into(),
                query: "COMMIT".into(),
            });
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlResilientError> {
        self.live_state().map(|_| ())
    }

    fn last_insert_id(&mut self) -> Result<i64, SqlResilientError> {
        self.live_state().map(|state| state.last_insert_id)
    }
}

/// Records requested delays instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn slept(&self) -> Vec<Duration> {
        match self.slept.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, delay: Duration) {
        match self.slept.lock() {
            Ok(mut guard) => guard.push(delay),
            Err(poisoned) => poisoned.into_inner().push(delay),
        }
    }
}
