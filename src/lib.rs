//! Driver registration and connection lifecycle for embedded SQL engines.
//!
//! The engine is a black box behind the [`engine::Engine`] contract: a
//! configuration object is built from the connection string's query options,
//! the engine opens a database for the target path, and a [`Connector`]
//! hands out per-use [`Connection`]s until it is closed. Every native
//! resource is released exactly once, on every path, via ownership transfer.
//!
//! ```rust
//! use sql_embedded_driver::prelude::*;
//!
//! # fn main() -> Result<(), DriverError> {
//! let driver = Driver::sqlite();
//! let connector = driver.open_connector(":memory:?journal_mode=MEMORY")?;
//! let mut conn = connector.connect()?;
//! conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);")?;
//! connector.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod connector;
pub mod driver;
pub mod dsn;
pub mod engine;
pub mod error;
pub mod prelude;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use config::{DRIVER_API_OPTION, DRIVER_API_VALUE, prepare_config};
pub use connection::Connection;
pub use connector::{ConnInitFn, Connector};
pub use driver::Driver;
pub use dsn::Dsn;
pub use engine::{Engine, EngineConfig, EngineConnection, EngineDatabase, EngineError};
pub use error::DriverError;

#[cfg(feature = "sqlite")]
pub use engine::sqlite::{SQLITE_DRIVER_NAME, SqliteEngine, register_sqlite};
