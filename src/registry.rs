//! Named engines owned by the application.
//!
//! Each logical database gets one [`ExecutionEngine`] keyed by name; the registry owns them and
//! hands out mutable borrows, so there is no shared global state.

use std::collections::HashMap;

use tracing::debug;

use crate::driver::Driver;
use crate::engine::ExecutionEngine;
use crate::error::SqlResilientError;

/// Name used when an application talks to a single database.
pub const DEFAULT_CONNECTION_NAME: &str = "default";

pub struct ConnectionRegistry<D: Driver> {
    engines: HashMap<String, ExecutionEngine<D>>,
}

impl<D: Driver> Default for ConnectionRegistry<D> {
    fn default() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }
}

impl<D: Driver> ConnectionRegistry<D> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `engine` under `name`, returning whichever engine it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        engine: ExecutionEngine<D>,
    ) -> Option<ExecutionEngine<D>> {
        let name = name.into();
        debug!(name = %name, "registering engine");
        self.engines.insert(name, engine)
    }

    /// # Errors
    /// Returns [`SqlResilientError::Unregistered`] if no engine has that name.
    pub fn get(&mut self, name: &str) -> Result<&mut ExecutionEngine<D>, SqlResilientError> {
        self.engines
            .get_mut(name)
            .ok_or_else(|| SqlResilientError::Unregistered(name.to_owned()))
    }

    /// # Errors
    /// Returns [`SqlResilientError::Unregistered`] if no engine has that name.
    pub fn get_ref(&self, name: &str) -> Result<&ExecutionEngine<D>, SqlResilientError> {
        self.engines
            .get(name)
            .ok_or_else(|| SqlResilientError::Unregistered(name.to_owned()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn remove(&mut self, name: &str) -> Option<ExecutionEngine<D>> {
        self.engines.remove(name)
    }

    /// Close every engine's connection and unregister it. Later lookups fail with
    /// [`SqlResilientError::Unregistered`] instead of quietly opening a fresh handle.
    pub fn disconnect_all(&mut self) {
        for (name, mut engine) in self.engines.drain() {
            debug!(name = %name, "disconnecting engine");
            engine.disconnect();
        }
    }
}

impl<D: Driver> std::fmt::Debug for ConnectionRegistry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("names", &self.names())
            .finish()
    }
}
