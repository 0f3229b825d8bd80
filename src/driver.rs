//! Driver values and the process-wide driver registry.
//!
//! A [`Driver`] is the stable registration identity for one engine; it holds
//! no mutable state. The registry is write-once per name: registration for a
//! name that already exists is refused, and registered drivers live for the
//! rest of the process.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use tracing::debug;

use crate::connection::Connection;
use crate::connector::{ConnInitFn, Connector};
use crate::engine::Engine;
use crate::error::DriverError;

/// Registration entry point for one embedded engine.
#[derive(Clone)]
pub struct Driver {
    engine: Arc<dyn Engine>,
}

impl Driver {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    /// Open the engine for `dsn` and return a reusable connector.
    ///
    /// The caller owns the connector and should close it when done; dropping
    /// it unclosed still releases everything.
    ///
    /// # Errors
    /// Propagates the connector-construction errors of
    /// [`Connector::new`].
    pub fn open_connector(&self, dsn: &str) -> Result<Connector, DriverError> {
        Connector::new(Arc::clone(&self.engine), dsn)
    }

    /// Like [`Driver::open_connector`], with a connection-init hook.
    ///
    /// # Errors
    /// Propagates the connector-construction errors of
    /// [`Connector::with_init`].
    pub fn open_connector_with_init(
        &self,
        dsn: &str,
        init_fn: Arc<ConnInitFn>,
    ) -> Result<Connector, DriverError> {
        Connector::with_init(Arc::clone(&self.engine), dsn, init_fn)
    }

    /// One-shot open: build a connector and immediately produce a connection.
    ///
    /// The connection co-owns the connector, so the engine stays open for the
    /// connection's lifetime and is released when the connection drops.
    ///
    /// # Errors
    /// Propagates connector construction and connect errors.
    pub fn open(&self, dsn: &str) -> Result<Connection, DriverError> {
        let connector = Arc::new(self.open_connector(dsn)?);
        let mut conn = connector.connect()?;
        conn.attach_owner(connector);
        Ok(conn)
    }

    /// The engine this driver fronts.
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("engine", &self.engine.name())
            .finish()
    }
}

lazy_static! {
    static ref DRIVERS: RwLock<HashMap<String, Driver>> = RwLock::new(HashMap::new());
}

/// Register `driver` under `name` for the rest of the process.
///
/// # Errors
/// Returns `DriverError::AlreadyRegistered` if the name is taken.
pub fn register(name: &str, driver: Driver) -> Result<(), DriverError> {
    let mut drivers = DRIVERS
        .write()
        .map_err(|_| DriverError::Other("driver registry lock poisoned".into()))?;
    if drivers.contains_key(name) {
        return Err(DriverError::AlreadyRegistered(name.to_owned()));
    }
    debug!(name, engine = driver.engine.name(), "driver registered");
    drivers.insert(name.to_owned(), driver);
    Ok(())
}

/// Look up a registered driver by name.
///
/// # Errors
/// Returns `DriverError::UnknownDriver` if nothing is registered under
/// `name`.
pub fn lookup(name: &str) -> Result<Driver, DriverError> {
    let drivers = DRIVERS
        .read()
        .map_err(|_| DriverError::Other("driver registry lock poisoned".into()))?;
    drivers
        .get(name)
        .cloned()
        .ok_or_else(|| DriverError::UnknownDriver(name.to_owned()))
}

/// Convenience: look up `name` and open a one-shot connection for `dsn`.
///
/// # Errors
/// Propagates [`lookup`] and [`Driver::open`] errors.
pub fn open(name: &str, dsn: &str) -> Result<Connection, DriverError> {
    lookup(name)?.open(dsn)
}
