use thiserror::Error;

use crate::engine::EngineError;

/// Errors surfaced by the driver layer.
///
/// Every engine failure is wrapped at the call site where it happened, with
/// the engine's own message preserved as the error source. Nothing here is
/// retried; failures are treated as non-transient.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("could not parse connection string: {0}")]
    ConfigParse(String),

    #[error("could not create config for database: {0}")]
    ConfigCreate(#[source] EngineError),

    #[error("could not set config option {key}={value}: {source}")]
    ConfigSet {
        key: String,
        value: String,
        #[source]
        source: EngineError,
    },

    #[error("could not open database: {0}")]
    Open(#[source] EngineError),

    #[error("could not open connection: {0}")]
    Connect(#[source] EngineError),

    #[error("SQL execution error: {0}")]
    Execution(#[source] EngineError),

    #[error("connector is already closed")]
    AlreadyClosed,

    #[error("driver already registered under name {0:?}")]
    AlreadyRegistered(String),

    #[error("no driver registered under name {0:?}")]
    UnknownDriver(String),

    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// True for the config-building family of errors (parse, create, set).
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            DriverError::ConfigParse(_)
                | DriverError::ConfigCreate(_)
                | DriverError::ConfigSet { .. }
        )
    }
}
