//! Per-use connection handle produced by a [`crate::connector::Connector`].

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::connector::Connector;
use crate::engine::EngineConnection;
use crate::error::DriverError;

/// One open session against an embedded engine.
///
/// A connection's lifetime is independent of the connector that produced it;
/// dropping it releases the underlying engine session. Connections obtained
/// through [`crate::driver::Driver::open`] additionally co-own their
/// connector, so the engine stays open until the connection is dropped.
pub struct Connection {
    raw: Box<dyn EngineConnection>,
    // Set on the Driver::open path only; keeps the engine handle alive.
    owner: Option<Arc<Connector>>,
}

impl Connection {
    pub(crate) fn new(raw: Box<dyn EngineConnection>) -> Self {
        Self { raw, owner: None }
    }

    pub(crate) fn attach_owner(&mut self, connector: Arc<Connector>) {
        self.owner = Some(connector);
    }

    /// Run one or more statements, discarding any rows they produce.
    ///
    /// This is the capability connection-init hooks use for session setup
    /// (pragmas and the like).
    ///
    /// # Errors
    /// Returns `DriverError::Execution` if the engine rejects a statement.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), DriverError> {
        self.raw.execute_batch(sql).map_err(DriverError::Execution)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("owns_connector", &self.owner.is_some())
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!("connection released");
    }
}
