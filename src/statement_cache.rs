use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::driver::DriverConnection;
use crate::error::SqlResilientError;

/// SHA-256 hex digest of a rewritten query text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementKey(String);

impl StatementKey {
    #[must_use]
    pub fn for_sql(sql: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(sql.as_bytes());
        StatementKey(format!("{:x}", hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A driver statement handle together with the text it was prepared from.
#[derive(Debug)]
pub struct PreparedStatement<S> {
    key: StatementKey,
    sql: Arc<str>,
    handle: S,
}

impl<S> PreparedStatement<S> {
    #[must_use]
    pub fn key(&self) -> &StatementKey {
        &self.key
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn handle(&self) -> &S {
        &self.handle
    }
}

/// Prepared statements for one connection, keyed by the digest of their text.
///
/// Entries are never evicted individually; the owning connection manager drops the whole cache
/// when the connection is replaced.
#[derive(Debug)]
pub struct StatementCache<S> {
    entries: HashMap<StatementKey, Arc<PreparedStatement<S>>>,
}

impl<S> Default for StatementCache<S> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<S> StatementCache<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached statement for `sql`, preparing it on `conn` on first use.
    ///
    /// # Errors
    /// Propagates the driver's preparation error; nothing is cached in that case.
    pub fn get_or_prepare<C>(
        &mut self,
        conn: &mut C,
        sql: &str,
    ) -> Result<Arc<PreparedStatement<S>>, SqlResilientError>
    where
        C: DriverConnection<Statement = S>,
    {
        let key = StatementKey::for_sql(sql);
        if let Some(existing) = self.entries.get(&key) {
            return Ok(Arc::clone(existing));
        }

        debug!(key = %key, "preparing statement");
        let handle = conn.prepare(sql)?;
        let prepared = Arc::new(PreparedStatement {
            key: key.clone(),
            sql: Arc::from(sql),
            handle,
        });
        self.entries.insert(key, Arc::clone(&prepared));
        Ok(prepared)
    }

    #[must_use]
    pub fn get(&self, sql: &str) -> Option<Arc<PreparedStatement<S>>> {
        self.entries.get(&StatementKey::for_sql(sql)).cloned()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable_sha256() {
        let key = StatementKey::for_sql("");
        assert_eq!(
            key.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(StatementKey::for_sql("SELECT 1"), StatementKey::for_sql("SELECT 1"));
        assert_ne!(StatementKey::for_sql("SELECT 1"), StatementKey::for_sql("SELECT 2"));
    }
}
