// Engine module - the opaque handle contract an embedded engine must satisfy
//
// The driver layer never sees engine internals; it only moves handles around:
// - EngineConfig: mutable option set, consumed when the engine opens
// - EngineDatabase: one open database instance, source of connections
// - EngineConnection: one session against an open database
//
// Handles transfer by move (`Box<dyn ...>`), so a release happens exactly
// where ownership ends and double-release is not expressible.

use std::any::Any;

use thiserror::Error;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEngine;

/// Failure reported by an engine: a status code plus the engine's own message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Engine-defined status code; zero when the engine reports none.
    pub code: i32,
    /// Human-readable message from the engine.
    pub message: String,
}

impl EngineError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// An embedded database engine reachable only through opaque handles.
///
/// Implementations are long-lived and shared (`Arc<dyn Engine>`); all calls
/// are direct blocking calls into the engine.
pub trait Engine: Send + Sync {
    /// Short identifier used in log events and registry defaults.
    fn name(&self) -> &'static str;

    /// Allocate a fresh, empty configuration object.
    ///
    /// # Errors
    /// Returns `EngineError` if the engine cannot allocate the resource.
    fn create_config(&self) -> Result<Box<dyn EngineConfig>, EngineError>;

    /// Open a database instance for `target` with the given configuration.
    ///
    /// Ownership of `config` moves into the call: on success the returned
    /// database keeps it for its own lifetime; on failure the engine drops it
    /// before returning, so the caller never has to clean up.
    ///
    /// # Errors
    /// Returns `EngineError` if the target or configuration is rejected.
    fn open(
        &self,
        target: &str,
        config: Box<dyn EngineConfig>,
    ) -> Result<Box<dyn EngineDatabase>, EngineError>;
}

/// Mutable engine-level option set, applied one pair at a time.
pub trait EngineConfig: Send {
    /// Apply a single option.
    ///
    /// # Errors
    /// Returns `EngineError` if the engine rejects the name or value.
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError>;

    /// Downcast support so an engine can recover its own config type from the
    /// boxed handle it is given back in [`Engine::open`].
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// One open database instance. Dropping it releases the engine resource and
/// the configuration it absorbed.
pub trait EngineDatabase: Send + Sync {
    /// Create a new session against this database.
    ///
    /// Engines are expected to make this safe to call from multiple threads
    /// against the same handle.
    ///
    /// # Errors
    /// Returns `EngineError` if the engine cannot create another session.
    fn connect(&self) -> Result<Box<dyn EngineConnection>, EngineError>;
}

/// One session against an open database. Dropping it releases the session.
pub trait EngineConnection: Send {
    /// Run one or more statements, discarding any rows they produce.
    ///
    /// # Errors
    /// Returns `EngineError` if any statement fails.
    fn execute_batch(&mut self, sql: &str) -> Result<(), EngineError>;
}
