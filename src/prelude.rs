//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::connection::Connection;
pub use crate::connector::{ConnInitFn, Connector};
pub use crate::driver::Driver;
pub use crate::dsn::Dsn;
pub use crate::engine::{Engine, EngineError};
pub use crate::error::DriverError;

#[cfg(feature = "sqlite")]
pub use crate::engine::sqlite::{SQLITE_DRIVER_NAME, SqliteEngine, register_sqlite};
