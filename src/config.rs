use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::driver::Driver;
use crate::engine::ExecutionEngine;
use crate::error::SqlResilientError;
use crate::profiler::ProfilerSink;
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};

/// Connection credentials, fixed for the lifetime of an engine.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    dsn: String,
    username: String,
    secret: String,
}

impl Credentials {
    #[must_use]
    pub fn new(
        dsn: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            dsn: dsn.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }

    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("dsn", &self.dsn)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Runtime options for an [`ExecutionEngine`].
pub struct EngineOptions {
    pub retry: RetryPolicy,
    pub sleeper: Box<dyn Sleeper + Send>,
    pub profiler: Option<Box<dyn ProfilerSink + Send>>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            sleeper: Box::new(ThreadSleeper),
            profiler: None,
        }
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("retry", &self.retry)
            .field("profiler", &self.profiler.is_some())
            .finish_non_exhaustive()
    }
}

/// Fluent builder for engine options.
#[derive(Debug, Default)]
pub struct EngineOptionsBuilder {
    opts: EngineOptions,
}

impl EngineOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.opts.retry = retry;
        self
    }

    #[must_use]
    pub fn sleeper(mut self, sleeper: impl Sleeper + Send + 'static) -> Self {
        self.opts.sleeper = Box::new(sleeper);
        self
    }

    #[must_use]
    pub fn profiler(mut self, profiler: impl ProfilerSink + Send + 'static) -> Self {
        self.opts.profiler = Some(Box::new(profiler));
        self
    }

    #[must_use]
    pub fn finish(self) -> EngineOptions {
        self.opts
    }

    /// Build an engine. No connection is opened until first use.
    #[must_use]
    pub fn build<D: Driver>(self, driver: D, credentials: Credentials) -> ExecutionEngine<D> {
        ExecutionEngine::with_options(driver, credentials, self.finish())
    }
}

/// Serializable engine configuration.
///
/// ```rust
/// use resilient_sql::EngineConfig;
///
/// let cfg = EngineConfig::from_json_str(
///     r#"{ "dsn": "app.db", "retry_delays_secs": [0.1, 0.2] }"#,
/// ).unwrap();
/// assert_eq!(cfg.retry_policy().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub dsn: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub retry_delays_secs: Option<Vec<f64>>,
}

impl EngineConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Config`] if the JSON is malformed or missing `dsn`.
    pub fn from_json_str(json: &str) -> Result<Self, SqlResilientError> {
        serde_json::from_str(json)
            .map_err(|e| SqlResilientError::Config(format!("invalid engine config: {e}")))
    }

    /// Read and parse a JSON file.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Config`] if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SqlResilientError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SqlResilientError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.dsn, &self.username, &self.password)
    }

    /// The configured schedule, or the default `[0.5s, 1s, 3s]` when absent.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Config`] if a delay is invalid.
    pub fn retry_policy(&self) -> Result<RetryPolicy, SqlResilientError> {
        match &self.retry_delays_secs {
            Some(secs) => RetryPolicy::from_secs_f64(secs),
            None => Ok(RetryPolicy::default()),
        }
    }

    /// Build an engine for `driver` from this configuration.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Config`] if the retry schedule is invalid.
    pub fn build<D: Driver>(&self, driver: D) -> Result<ExecutionEngine<D>, SqlResilientError> {
        Ok(EngineOptionsBuilder::new()
            .retry(self.retry_policy()?)
            .build(driver, self.credentials()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret() {
        let creds = Credentials::new("mysql:host=db", "app", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("app"));
        assert!(!rendered.contains("hunter2"));
        assert_eq!(creds.secret(), "hunter2");
    }

    #[test]
    fn config_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{ "dsn": ":memory:" }"#).unwrap();
        assert_eq!(cfg.username, "");
        assert_eq!(cfg.retry_policy().unwrap(), RetryPolicy::default());
    }

    #[test]
    fn config_requires_dsn() {
        assert!(matches!(
            EngineConfig::from_json_str("{}"),
            Err(SqlResilientError::Config(_))
        ));
    }

    #[test]
    fn config_rejects_bad_delay() {
        let cfg =
            EngineConfig::from_json_str(r#"{ "dsn": "x", "retry_delays_secs": [-2] }"#).unwrap();
        assert!(cfg.retry_policy().is_err());
    }
}
