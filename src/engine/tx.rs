use tracing::debug;

use super::{ConnectionState, ExecutionEngine};
use crate::driver::{Driver, DriverConnection};
use crate::error::SqlResilientError;

impl<D: Driver> ExecutionEngine<D> {
    /// Begin a native transaction, connecting first if needed.
    ///
    /// While the transaction is open the engine refuses to reconnect: a dropped link surfaces as
    /// [`SqlResilientError::TransactionReconnect`] instead of silently losing the work.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Defunct`], a connection error, or the driver's begin error.
    pub fn transaction_begin(&mut self) -> Result<(), SqlResilientError> {
        self.ensure_usable()?;
        self.connection.set_in_transaction(true);
        let outcome = self.connection.connection_mut()?.begin_transaction();
        if outcome.is_ok() {
            debug!("transaction started");
        }
        outcome
    }

    /// Commit the open transaction. The transaction flag clears only if the commit succeeds.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Defunct`], a connection error, or the driver's commit error.
    pub fn transaction_commit(&mut self) -> Result<(), SqlResilientError> {
        self.ensure_usable()?;
        self.connection.connection_mut()?.commit()?;
        self.connection.set_in_transaction(false);
        debug!("transaction committed");
        Ok(())
    }

    /// Roll back the open transaction. The transaction flag clears only if the rollback succeeds.
    ///
    /// # Errors
    /// Returns [`SqlResilientError::Defunct`], a connection error, or the driver's rollback error.
    pub fn transaction_rollback(&mut self) -> Result<(), SqlResilientError> {
        self.ensure_usable()?;
        self.connection.connection_mut()?.rollback()?;
        self.connection.set_in_transaction(false);
        debug!("transaction rolled back");
        Ok(())
    }

    #[must_use]
    pub fn transaction_active(&self) -> bool {
        self.connection.in_transaction()
    }

    fn ensure_usable(&mut self) -> Result<(), SqlResilientError> {
        if self.is_defunct() {
            return Err(SqlResilientError::Defunct);
        }
        self.connection.connect()?;
        self.state = ConnectionState::Connected;
        Ok(())
    }
}
