//! Connector: the long-lived factory tying one open engine instance to the
//! connections handed out to callers.

use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::config::prepare_config;
use crate::connection::Connection;
use crate::dsn::Dsn;
use crate::engine::{Engine, EngineDatabase};
use crate::error::DriverError;

/// Hook run once for each new connection before it is handed to the caller.
///
/// The hook sees the connection through its minimal statement-execution
/// capability; a hook error aborts the connect and is returned verbatim.
pub type ConnInitFn = dyn Fn(&mut Connection) -> Result<(), DriverError> + Send + Sync;

/// Reusable factory producing [`Connection`]s against one open database.
///
/// The open database sits behind a read/write guard: any number of
/// `connect` calls may run concurrently, while `close` takes the write side,
/// blocking until in-flight connects finish. After `close`, `connect` fails
/// fast with [`DriverError::AlreadyClosed`].
pub struct Connector {
    engine: Arc<dyn Engine>,
    database: RwLock<Option<Box<dyn EngineDatabase>>>,
    init_fn: Option<Arc<ConnInitFn>>,
    target: String,
}

impl Connector {
    /// Open the engine for `dsn` and wrap it in a connector with no
    /// connection-init hook.
    ///
    /// # Errors
    /// Returns the config-building errors of
    /// [`prepare_config`](crate::config::prepare_config), or
    /// `DriverError::Open` if the engine rejects the target or configuration.
    pub fn new(engine: Arc<dyn Engine>, dsn: &str) -> Result<Self, DriverError> {
        Self::build(engine, dsn, None)
    }

    /// Like [`Connector::new`], with a hook run once per new connection.
    ///
    /// # Errors
    /// Same as [`Connector::new`].
    pub fn with_init(
        engine: Arc<dyn Engine>,
        dsn: &str,
        init_fn: Arc<ConnInitFn>,
    ) -> Result<Self, DriverError> {
        Self::build(engine, dsn, Some(init_fn))
    }

    fn build(
        engine: Arc<dyn Engine>,
        dsn: &str,
        init_fn: Option<Arc<ConnInitFn>>,
    ) -> Result<Self, DriverError> {
        // One parse serves both config building and target extraction.
        let dsn = Dsn::parse(dsn)?;
        let config = prepare_config(engine.as_ref(), &dsn)?;

        // Ownership of `config` moves into the engine here; on failure the
        // engine drops it before returning, so there is nothing to clean up.
        let database = engine
            .open(dsn.target(), config)
            .map_err(DriverError::Open)?;

        debug!(engine = engine.name(), path = dsn.target(), "database opened");
        Ok(Self {
            engine,
            database: RwLock::new(Some(database)),
            init_fn,
            target: dsn.target().to_owned(),
        })
    }

    /// Create a new connection against the open database.
    ///
    /// # Errors
    /// Returns `DriverError::AlreadyClosed` after [`Connector::close`],
    /// `DriverError::Connect` if the engine cannot create a session, or the
    /// init hook's error verbatim (the session is released first).
    pub fn connect(&self) -> Result<Connection, DriverError> {
        let guard = self
            .database
            .read()
            .map_err(|_| DriverError::Other("connector lock poisoned".into()))?;
        let Some(database) = guard.as_ref() else {
            return Err(DriverError::AlreadyClosed);
        };

        let raw = database.connect().map_err(DriverError::Connect)?;
        let mut conn = Connection::new(raw);

        if let Some(init_fn) = &self.init_fn {
            if let Err(err) = init_fn(&mut conn) {
                // Dropping the connection releases the engine session before
                // the hook error surfaces.
                drop(conn);
                return Err(err);
            }
        }

        debug!(engine = self.engine.name(), path = %self.target, "connection created");
        Ok(conn)
    }

    /// Release the open database and the configuration it absorbed.
    ///
    /// Blocks until no `connect` is in flight. The database is taken out of
    /// its slot, so the release happens exactly once; calling `close` again
    /// is a no-op.
    ///
    /// # Errors
    /// Returns `DriverError::Other` only if the internal lock was poisoned.
    pub fn close(&self) -> Result<(), DriverError> {
        let mut guard = self
            .database
            .write()
            .map_err(|_| DriverError::Other("connector lock poisoned".into()))?;
        match guard.take() {
            Some(database) => {
                drop(database);
                debug!(engine = self.engine.name(), path = %self.target, "database closed");
            }
            None => {
                debug!(engine = self.engine.name(), path = %self.target, "close on already-closed connector");
            }
        }
        Ok(())
    }

    /// The target path this connector was opened with.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether [`Connector::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.database.read().map(|guard| guard.is_none()).unwrap_or(true)
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("engine", &self.engine.name())
            .field("target", &self.target)
            .field("closed", &self.is_closed())
            .finish()
    }
}
