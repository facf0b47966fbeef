use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Params, Statement};

use crate::error::SqlResilientError;
use crate::query_utils::extract_column_names;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
/// Returns [`SqlResilientError::SqliteError`] if the column cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, SqlResilientError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a row-returning statement and materialize every row.
///
/// `rows_affected` on the result is the number of rows fetched.
///
/// # Errors
/// Returns [`SqlResilientError::SqliteError`] if the query or a row read fails.
pub fn build_result_set<P: Params>(
    stmt: &mut Statement<'_>,
    params: P,
) -> Result<ResultSet, SqlResilientError> {
    let column_names = Arc::new(extract_column_names(stmt.column_names(), |name| *name));
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(column_names);

    let mut rows = stmt.query(params)?;
    while let Some(row) = rows.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
