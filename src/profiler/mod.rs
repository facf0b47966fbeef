//! Query timing telemetry.
//!
//! The engine reports every successful execution to a [`ProfilerSink`]. [`ProfilerResults`] is
//! the in-memory sink: it keeps each record, running totals, and a per-statement-kind breakdown
//! that the renderers in [`view`] format for humans.

use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use regex::Regex;

pub mod view;

pub use view::{ProfilerView, SummaryView, TableView};

/// Receives one event per successful execution.
pub trait ProfilerSink {
    fn add_query(&mut self, query: &str, duration: Duration, affected_rows: usize);
}

/// Shares a sink with the caller so results can be read back while the engine owns a clone.
impl<S: ProfilerSink + ?Sized> ProfilerSink for Arc<Mutex<S>> {
    fn add_query(&mut self, query: &str, duration: Duration, affected_rows: usize) {
        let mut guard = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.add_query(query, duration, affected_rows);
    }
}

/// Statement kind, taken from the leading keyword of the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    Select,
    Update,
    Insert,
    Delete,
    Other,
}

static LEADING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(select|update|insert|delete)").expect("static regex is valid")
});

impl QueryKind {
    /// Breakdown order.
    pub const ALL: [QueryKind; 5] = [
        QueryKind::Select,
        QueryKind::Update,
        QueryKind::Insert,
        QueryKind::Delete,
        QueryKind::Other,
    ];

    #[must_use]
    pub fn classify(query: &str) -> Self {
        let Some(caps) = LEADING_KEYWORD.captures(query) else {
            return QueryKind::Other;
        };
        match caps[1].to_ascii_lowercase().as_str() {
            "select" => QueryKind::Select,
            "update" => QueryKind::Update,
            "insert" => QueryKind::Insert,
            "delete" => QueryKind::Delete,
            _ => QueryKind::Other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Select => "select",
            QueryKind::Update => "update",
            QueryKind::Insert => "insert",
            QueryKind::Delete => "delete",
            QueryKind::Other => "other",
        }
    }
}

/// One profiled execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfiledQuery {
    pub query: String,
    pub duration: Duration,
    pub affected_rows: usize,
}

/// Totals and queries for one [`QueryKind`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KindProfile {
    pub total_execution_time: Duration,
    pub total_affected_rows: usize,
    pub queries: Vec<ProfiledQuery>,
}

/// Accumulating in-memory sink.
#[derive(Debug, Clone, Default)]
pub struct ProfilerResults {
    queries: Vec<ProfiledQuery>,
    total_affected_rows: usize,
    total_execution_time: Duration,
}

impl ProfilerResults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that can be handed to an engine while the caller keeps a handle for reading.
    #[must_use]
    pub fn shared() -> Arc<Mutex<ProfilerResults>> {
        Arc::new(Mutex::new(ProfilerResults::new()))
    }

    #[must_use]
    pub fn total_queries(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn total_affected_rows(&self) -> usize {
        self.total_affected_rows
    }

    #[must_use]
    pub fn total_execution_time(&self) -> Duration {
        self.total_execution_time
    }

    #[must_use]
    pub fn queries(&self) -> &[ProfiledQuery] {
        &self.queries
    }

    /// Records grouped by kind, always listing every kind in [`QueryKind::ALL`] order.
    #[must_use]
    pub fn breakdown(&self) -> Vec<(QueryKind, KindProfile)> {
        let mut groups: Vec<(QueryKind, KindProfile)> = QueryKind::ALL
            .iter()
            .map(|kind| (*kind, KindProfile::default()))
            .collect();
        for record in &self.queries {
            let kind = QueryKind::classify(&record.query);
            if let Some((_, profile)) = groups.iter_mut().find(|(k, _)| *k == kind) {
                profile.total_execution_time += record.duration;
                profile.total_affected_rows += record.affected_rows;
                profile.queries.push(record.clone());
            }
        }
        groups
    }
}

impl ProfilerSink for ProfilerResults {
    fn add_query(&mut self, query: &str, duration: Duration, affected_rows: usize) {
        self.queries.push(ProfiledQuery {
            query: query.to_owned(),
            duration,
            affected_rows,
        });
        self.total_affected_rows += affected_rows;
        self.total_execution_time += duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_leading_keyword() {
        assert_eq!(QueryKind::classify("  select 1"), QueryKind::Select);
        assert_eq!(QueryKind::classify("UPDATE t SET a = 1"), QueryKind::Update);
        assert_eq!(QueryKind::classify("\nInsert into t values (1)"), QueryKind::Insert);
        assert_eq!(QueryKind::classify("DELETE FROM t"), QueryKind::Delete);
        assert_eq!(QueryKind::classify("WITH x AS (SELECT 1) SELECT * FROM x"), QueryKind::Other);
    }

    #[test]
    fn totals_and_breakdown() {
        let mut results = ProfilerResults::new();
        results.add_query("SELECT 1", Duration::from_millis(2), 1);
        results.add_query("SELECT 2", Duration::from_millis(3), 1);
        results.add_query("DELETE FROM t", Duration::from_millis(5), 4);

        assert_eq!(results.total_queries(), 3);
        assert_eq!(results.total_affected_rows(), 6);
        assert_eq!(results.total_execution_time(), Duration::from_millis(10));

        let breakdown = results.breakdown();
        let kinds: Vec<_> = breakdown.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, QueryKind::ALL);
        assert_eq!(breakdown[0].1.queries.len(), 2);
        assert_eq!(breakdown[0].1.total_execution_time, Duration::from_millis(5));
        assert_eq!(breakdown[3].1.total_affected_rows, 4);
        assert!(breakdown[4].1.queries.is_empty());
    }

    #[test]
    fn shared_sink_is_readable() {
        let shared = ProfilerResults::shared();
        let mut sink = Arc::clone(&shared);
        sink.add_query("UPDATE t SET a = 1", Duration::from_millis(1), 2);
        assert_eq!(shared.lock().unwrap().total_affected_rows(), 2);
    }
}
