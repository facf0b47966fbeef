use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Connection, Statement, params_from_iter};

use super::params::row_value_to_sqlite_value;
use super::query::build_result_set;
use crate::driver::DriverConnection;
use crate::error::SqlResilientError;
use crate::results::ResultSet;
use crate::types::BoundParams;

/// A live `rusqlite` connection.
pub struct SqliteConnection {
    conn: Connection,
}

/// Handle to a statement held in `rusqlite`'s per-connection cache.
#[derive(Debug, Clone)]
pub struct SqliteStatement {
    sql: Arc<str>,
}

impl SqliteStatement {
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl SqliteConnection {
    pub(crate) fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Borrow the underlying `rusqlite` connection.
    #[must_use]
    pub fn raw(&self) -> &Connection {
        &self.conn
    }
}

/// Bind values in parameter-index order, requiring every placeholder to be bound and every
/// supplied value to be used.
fn ordered_values(stmt: &Statement<'_>, params: &BoundParams) -> Result<Vec<Value>, SqlResilientError> {
    let count = stmt.parameter_count();
    let mut values = Vec::with_capacity(count);
    let mut used = BTreeSet::new();

    for idx in 1..=count {
        let Some(raw_name) = stmt.parameter_name(idx) else {
            return Err(SqlResilientError::Parameter(format!(
                "positional placeholder at index {idx}; only :name placeholders are supported"
            )));
        };
        let name = raw_name.trim_start_matches([':', '@', '$']);
        let value = params.get(name).ok_or_else(|| {
            SqlResilientError::Parameter(format!("no value bound for placeholder :{name}"))
        })?;
        values.push(row_value_to_sqlite_value(value));
        used.insert(name);
    }

    if let Some(unused) = params.keys().find(|key| !used.contains(key.as_str())) {
        return Err(SqlResilientError::Parameter(format!(
            "parameter :{unused} does not appear in the statement"
        )));
    }
    Ok(values)
}

impl DriverConnection for SqliteConnection {
    type Statement = SqliteStatement;

    fn prepare(&mut self, sql: &str) -> Result<SqliteStatement, SqlResilientError> {
        // Warm rusqlite's cache so execution only re-fetches.
        self.conn.prepare_cached(sql)?;
        Ok(SqliteStatement { sql: Arc::from(sql) })
    }

    fn execute(
        &mut self,
        statement: &SqliteStatement,
        params: &BoundParams,
    ) -> Result<ResultSet, SqlResilientError> {
        let mut stmt = self.conn.prepare_cached(&statement.sql)?;
        let values = ordered_values(&stmt, params)?;

        if stmt.column_count() == 0 {
            let changed = stmt.execute(params_from_iter(values))?;
            Ok(ResultSet::from_rows_affected(changed))
        } else {
            build_result_set(&mut stmt, params_from_iter(values))
        }
    }

    fn ping(&mut self) -> Result<(), SqlResilientError> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<(), SqlResilientError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlResilientError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlResilientError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn last_insert_id(&mut self) -> Result<i64, SqlResilientError> {
        Ok(self.conn.last_insert_rowid())
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("autocommit", &self.conn.is_autocommit())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowValues;

    fn open() -> SqliteConnection {
        let mut conn = SqliteConnection::new(Connection::open_in_memory().unwrap());
        conn.conn
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);")
            .unwrap();
        conn
    }

    fn bound(pairs: &[(&str, RowValues)]) -> BoundParams {
        let mut params = BoundParams::new();
        for (name, value) in pairs {
            params.insert(name, value.clone());
        }
        params
    }

    #[test]
    fn dml_reports_changed_rows() {
        let mut conn = open();
        let stmt = conn.prepare("INSERT INTO t (name) VALUES (:name)").unwrap();
        let rs = conn
            .execute(&stmt, &bound(&[("name", RowValues::Text("a".into()))]))
            .unwrap();
        assert_eq!(rs.rows_affected, 1);
        assert!(rs.is_empty());
        assert_eq!(conn.last_insert_id().unwrap(), 1);
    }

    #[test]
    fn repeated_placeholder_binds_once() {
        let mut conn = open();
        let stmt = conn.prepare("SELECT :v AS a, :v AS b").unwrap();
        let rs = conn.execute(&stmt, &bound(&[("v", RowValues::Int(7))])).unwrap();
        let row = rs.row(0).unwrap();
        assert_eq!(row.get("a"), Some(&RowValues::Int(7)));
        assert_eq!(row.get("b"), Some(&RowValues::Int(7)));
    }

    #[test]
    fn unbound_placeholder_is_parameter_error() {
        let mut conn = open();
        let stmt = conn.prepare("SELECT * FROM t WHERE id = :id").unwrap();
        let err = conn.execute(&stmt, &BoundParams::new()).unwrap_err();
        assert!(matches!(err, SqlResilientError::Parameter(_)));
    }

    #[test]
    fn unused_value_is_parameter_error() {
        let mut conn = open();
        let stmt = conn.prepare("SELECT 1").unwrap();
        let err = conn
            .execute(&stmt, &bound(&[("extra", RowValues::Int(1))]))
            .unwrap_err();
        assert!(matches!(err, SqlResilientError::Parameter(_)));
    }

    #[test]
    fn ping_and_transaction() {
        let mut conn = open();
        conn.ping().unwrap();
        conn.begin_transaction().unwrap();
        assert!(!conn.raw().is_autocommit());
        conn.rollback().unwrap();
        assert!(conn.raw().is_autocommit());
    }
}
