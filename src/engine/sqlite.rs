//! `SQLite` backend for the engine contract, built on rusqlite.
//!
//! Engine-level options are validated when they are set, then turned into
//! open flags and session pragmas when the database opens. An in-memory
//! target maps to a uniquely named shared-cache database so every connection
//! from one handle sees the same data, anchored by a connection held for the
//! handle's lifetime.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::{Connection as RawConnection, OpenFlags};
use tracing::debug;

use super::{Engine, EngineConfig, EngineConnection, EngineDatabase, EngineError};
use crate::driver::Driver;
use crate::error::DriverError;

/// Name [`register_sqlite`] uses in the process-wide registry.
pub const SQLITE_DRIVER_NAME: &str = "sqlite";

/// Reserved target for a private in-memory database.
pub const MEMORY_TARGET: &str = ":memory:";

lazy_static! {
    static ref OPTION_KEY_RE: Regex =
        Regex::new("^[a-z][a-z0-9_]*$").expect("option key regex");
}

static MEMORY_DB_SEQ: AtomicU64 = AtomicU64::new(0);

/// The embedded `SQLite` engine.
#[derive(Debug, Default)]
pub struct SqliteEngine;

impl SqliteEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Engine for SqliteEngine {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn create_config(&self) -> Result<Box<dyn EngineConfig>, EngineError> {
        Ok(Box::new(SqliteConfig::default()))
    }

    fn open(
        &self,
        target: &str,
        config: Box<dyn EngineConfig>,
    ) -> Result<Box<dyn EngineDatabase>, EngineError> {
        let config = config
            .into_any()
            .downcast::<SqliteConfig>()
            .map_err(|_| EngineError::new("configuration object belongs to a different engine"))?;

        let resolved = resolve_target(target);
        let flags = config.open_flags();
        let pragma_sql = config.pragma_sql();

        // The anchor validates path and options up front and, for in-memory
        // targets, keeps the shared-cache database alive.
        let anchor = RawConnection::open_with_flags(&resolved, flags)
            .map_err(|e| EngineError::new(e.to_string()))?;
        if !pragma_sql.is_empty() {
            anchor
                .execute_batch(&pragma_sql)
                .map_err(|e| EngineError::new(e.to_string()))?;
        }

        debug!(path = target, resolved = %resolved, "sqlite database opened");
        Ok(Box::new(SqliteDatabase {
            resolved,
            flags,
            pragma_sql,
            anchor: Mutex::new(anchor),
        }))
    }
}

/// Option set for the `SQLite` backend; validated as it is filled.
#[derive(Debug, Default)]
struct SqliteConfig {
    read_only: bool,
    pragmas: Vec<(String, String)>,
}

impl SqliteConfig {
    fn open_flags(&self) -> OpenFlags {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        }
        flags
    }

    fn pragma_sql(&self) -> String {
        let mut sql = String::new();
        for (key, value) in &self.pragmas {
            sql.push_str(&format!("PRAGMA {key} = {value};\n"));
        }
        sql
    }
}

impl EngineConfig for SqliteConfig {
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        if !OPTION_KEY_RE.is_match(name) {
            return Err(EngineError::new(format!(
                "invalid configuration option name {name:?}"
            )));
        }
        match name {
            // Identity option; recorded by the engine, no session effect.
            "driver_api" => Ok(()),
            "access_mode" => match value.to_ascii_uppercase().as_str() {
                "READ_ONLY" => {
                    self.read_only = true;
                    Ok(())
                }
                "READ_WRITE" => {
                    self.read_only = false;
                    Ok(())
                }
                _ => Err(EngineError::new(format!(
                    "access_mode must be READ_ONLY or READ_WRITE, got {value:?}"
                ))),
            },
            "threads" | "busy_timeout" => {
                let parsed: u64 = value.parse().map_err(|_| {
                    EngineError::new(format!("{name} requires a non-negative integer, got {value:?}"))
                })?;
                self.pragmas.push((name.to_owned(), parsed.to_string()));
                Ok(())
            }
            "cache_size" => {
                let parsed: i64 = value.parse().map_err(|_| {
                    EngineError::new(format!("cache_size requires an integer, got {value:?}"))
                })?;
                self.pragmas.push((name.to_owned(), parsed.to_string()));
                Ok(())
            }
            "journal_mode" => {
                let mode = value.to_ascii_uppercase();
                match mode.as_str() {
                    "DELETE" | "TRUNCATE" | "PERSIST" | "MEMORY" | "WAL" | "OFF" => {
                        self.pragmas.push((name.to_owned(), mode));
                        Ok(())
                    }
                    _ => Err(EngineError::new(format!(
                        "unsupported journal_mode {value:?}"
                    ))),
                }
            }
            "synchronous" => {
                let mode = value.to_ascii_uppercase();
                match mode.as_str() {
                    "OFF" | "NORMAL" | "FULL" | "EXTRA" | "0" | "1" | "2" | "3" => {
                        self.pragmas.push((name.to_owned(), mode));
                        Ok(())
                    }
                    _ => Err(EngineError::new(format!(
                        "unsupported synchronous mode {value:?}"
                    ))),
                }
            }
            "foreign_keys" => match value.to_ascii_lowercase().as_str() {
                "true" | "on" | "1" => {
                    self.pragmas.push((name.to_owned(), "ON".to_owned()));
                    Ok(())
                }
                "false" | "off" | "0" => {
                    self.pragmas.push((name.to_owned(), "OFF".to_owned()));
                    Ok(())
                }
                _ => Err(EngineError::new(format!(
                    "foreign_keys must be a boolean, got {value:?}"
                ))),
            },
            _ => Err(EngineError::new(format!(
                "unrecognized configuration option {name:?}"
            ))),
        }
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

struct SqliteDatabase {
    resolved: String,
    flags: OpenFlags,
    pragma_sql: String,
    // Held for the handle's lifetime; the Mutex makes the handle shareable
    // across threads even though rusqlite connections are not Sync.
    #[allow(dead_code)]
    anchor: Mutex<RawConnection>,
}

impl EngineDatabase for SqliteDatabase {
    fn connect(&self) -> Result<Box<dyn EngineConnection>, EngineError> {
        let conn = RawConnection::open_with_flags(&self.resolved, self.flags)
            .map_err(|e| EngineError::new(e.to_string()))?;
        if !self.pragma_sql.is_empty() {
            conn.execute_batch(&self.pragma_sql)
                .map_err(|e| EngineError::new(e.to_string()))?;
        }
        Ok(Box::new(SqliteSession { conn }))
    }
}

struct SqliteSession {
    conn: RawConnection,
}

impl EngineConnection for SqliteSession {
    fn execute_batch(&mut self, sql: &str) -> Result<(), EngineError> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| EngineError::new(e.to_string()))
    }
}

fn resolve_target(target: &str) -> String {
    if target.is_empty() || target == MEMORY_TARGET {
        let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);
        format!("file:sql_embedded_mem_{seq}?mode=memory&cache=shared")
    } else {
        target.to_owned()
    }
}

impl Driver {
    /// Driver fronting the built-in `SQLite` engine.
    #[must_use]
    pub fn sqlite() -> Self {
        Driver::new(Arc::new(SqliteEngine::new()))
    }
}

/// Register the `SQLite` driver under [`SQLITE_DRIVER_NAME`].
///
/// # Errors
/// Returns `DriverError::AlreadyRegistered` if something already claimed the
/// name.
pub fn register_sqlite() -> Result<(), DriverError> {
    crate::driver::register(SQLITE_DRIVER_NAME, Driver::sqlite())
}
