use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlResilientError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unable to reconnect to the database while a transaction is active")]
    TransactionReconnect,

    #[error("Generated placeholder `{name}` collides with an existing parameter in query:\n{query}")]
    ParamCollision { name: String, query: String },

    #[error(
        "Engine is defunct: the connection already failed irrecoverably and no further work will be attempted"
    )]
    Defunct,

    #[error("SQL execution error: {message}\n{query}")]
    QueryExecution { message: String, query: String },

    #[error("Query failed after {attempts} reconnect attempts: {source}\n{query}")]
    RetriesExhausted {
        attempts: usize,
        query: String,
        #[source]
        source: Box<SqlResilientError>,
    },

    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection name `{0}` has not been registered")]
    Unregistered(String),
}

impl SqlResilientError {
    /// Errors that must never enter the reconnect loop.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::TransactionReconnect
                | Self::ParamCollision { .. }
                | Self::Defunct
                | Self::Parameter(_)
                | Self::Config(_)
        )
    }

    /// Wrap a driver failure with the rendered query it was running.
    pub(crate) fn query_failed(err: &SqlResilientError, query: impl Into<String>) -> Self {
        match err {
            Self::QueryExecution { message, .. } => Self::QueryExecution {
                message: message.clone(),
                query: query.into(),
            },
            other => Self::QueryExecution {
                message: other.to_string(),
                query: query.into(),
            },
        }
    }
}
