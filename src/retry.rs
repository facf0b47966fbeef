//! Fixed reconnect schedule.
//!
//! Unlike an exponential strategy, the schedule is an explicit list: the number of reconnect
//! attempts is the length of the list and each attempt waits for its own delay first.

use std::fmt;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SqlResilientError;

/// Ordered backoff delays, one per reconnect attempt.
///
/// # Example
///
/// ```
/// use resilient_sql::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.len(), 3);
/// assert_eq!(policy.delays()[0], Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// A policy that never reconnects: the first connectivity failure is final.
    #[must_use]
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    /// Build a policy from delays expressed in seconds.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Config`] if any delay is negative or not finite.
    pub fn from_secs_f64(secs: &[f64]) -> Result<Self, SqlResilientError> {
        let delays = secs
            .iter()
            .map(|s| {
                Duration::try_from_secs_f64(*s).map_err(|e| {
                    SqlResilientError::Config(format!("invalid retry delay {s}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { delays })
    }

    #[must_use]
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn iter(&self) -> impl Iterator<Item = Duration> + '_ {
        self.delays.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// Sum of all delays; the longest a fully exhausted schedule blocks.
    #[must_use]
    pub fn total_delay(&self) -> Duration {
        self.delays.iter().sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(vec![
            Duration::from_millis(500),
            Duration::from_secs(1),
            Duration::from_secs(3),
        ])
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .delays
            .iter()
            .map(|d| format!("{}s", d.as_secs_f64()))
            .collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

impl Serialize for RetryPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let secs: Vec<f64> = self.delays.iter().map(Duration::as_secs_f64).collect();
        secs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RetryPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let secs = Vec::<f64>::deserialize(deserializer)?;
        RetryPolicy::from_secs_f64(&secs).map_err(serde::de::Error::custom)
    }
}

/// Blocks the calling thread between reconnect attempts.
pub trait Sleeper {
    fn sleep(&mut self, delay: Duration);
}

/// Default sleeper backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delays(),
            &[
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(3)
            ]
        );
        assert_eq!(policy.total_delay(), Duration::from_millis(4500));
        assert_eq!(policy.to_string(), "[0.5s, 1s, 3s]");
    }

    #[test]
    fn rejects_negative_delay() {
        assert!(matches!(
            RetryPolicy::from_secs_f64(&[0.5, -1.0]),
            Err(SqlResilientError::Config(_))
        ));
    }

    #[test]
    fn serde_as_seconds() {
        let policy: RetryPolicy = serde_json::from_str("[0.25, 2]").unwrap();
        assert_eq!(
            policy.delays(),
            &[Duration::from_millis(250), Duration::from_secs(2)]
        );
        assert_eq!(serde_json::to_string(&policy).unwrap(), "[0.25,2.0]");
    }

    #[test]
    fn none_is_empty() {
        assert!(RetryPolicy::none().is_empty());
    }
}
