//! Test-only engine with resource accounting and fault injection.
//!
//! `MockEngine` implements the engine contract without any real database:
//! every handle it creates increments a shared counter on construction and
//! decrements it on drop, panicking on double-release, so lifecycle tests can
//! assert that each resource is released exactly once. Failure points
//! (config allocation, option application, open, connect) can be armed
//! individually.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::{Engine, EngineConfig, EngineConnection, EngineDatabase, EngineError};

/// Shared, thread-safe view of everything a [`MockEngine`] has done.
#[derive(Debug, Default)]
pub struct MockState {
    configs_created: AtomicU64,
    configs_live: AtomicI64,
    databases_live: AtomicI64,
    connections_live: AtomicI64,
    opened_targets: Mutex<Vec<String>>,
    options_applied: Mutex<Vec<(String, String)>>,
    executed_sql: Mutex<Vec<String>>,
}

impl MockState {
    /// Total configuration objects ever allocated.
    pub fn configs_created(&self) -> u64 {
        self.configs_created.load(Ordering::SeqCst)
    }

    /// Configuration objects currently alive (not yet released).
    pub fn configs_live(&self) -> i64 {
        self.configs_live.load(Ordering::SeqCst)
    }

    /// Database handles currently alive.
    pub fn databases_live(&self) -> i64 {
        self.databases_live.load(Ordering::SeqCst)
    }

    /// Connections currently alive.
    pub fn connections_live(&self) -> i64 {
        self.connections_live.load(Ordering::SeqCst)
    }

    /// Targets passed to `open`, in order.
    pub fn opened_targets(&self) -> Vec<String> {
        self.opened_targets.lock().expect("mock state lock").clone()
    }

    /// Every option applied to any configuration object, in order.
    pub fn options_applied(&self) -> Vec<(String, String)> {
        self.options_applied
            .lock()
            .expect("mock state lock")
            .clone()
    }

    /// SQL run through any connection, in order.
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed_sql.lock().expect("mock state lock").clone()
    }

    /// True when no config, database, or connection is alive.
    pub fn all_released(&self) -> bool {
        self.configs_live() == 0 && self.databases_live() == 0 && self.connections_live() == 0
    }
}

/// Engine fake with per-call fault injection.
#[derive(Debug, Default)]
pub struct MockEngine {
    state: Arc<MockState>,
    fail_create_config: AtomicBool,
    fail_open: AtomicBool,
    fail_connect: AtomicBool,
    rejected_options: Mutex<Vec<String>>,
}

impl MockEngine {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Counter and journal handle shared with every resource this engine
    /// creates.
    #[must_use]
    pub fn state(&self) -> Arc<MockState> {
        Arc::clone(&self.state)
    }

    /// Make the next `create_config` calls fail.
    pub fn fail_create_config(&self, fail: bool) {
        self.fail_create_config.store(fail, Ordering::SeqCst);
    }

    /// Make the next `open` calls fail.
    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Make the next `connect` calls fail.
    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Reject any future `set_option` for `key`.
    pub fn reject_option(&self, key: &str) {
        self.rejected_options
            .lock()
            .expect("mock engine lock")
            .push(key.to_owned());
    }
}

impl Engine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn create_config(&self) -> Result<Box<dyn EngineConfig>, EngineError> {
        if self.fail_create_config.load(Ordering::SeqCst) {
            return Err(EngineError::new("mock: config allocation refused"));
        }
        self.state.configs_created.fetch_add(1, Ordering::SeqCst);
        self.state.configs_live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConfig {
            state: Arc::clone(&self.state),
            rejected: self
                .rejected_options
                .lock()
                .expect("mock engine lock")
                .clone(),
            released: false,
        }))
    }

    fn open(
        &self,
        target: &str,
        config: Box<dyn EngineConfig>,
    ) -> Result<Box<dyn EngineDatabase>, EngineError> {
        let config = config
            .into_any()
            .downcast::<MockConfig>()
            .map_err(|_| EngineError::new("mock: foreign configuration object"))?;
        if self.fail_open.load(Ordering::SeqCst) {
            // `config` drops here, releasing it before the error returns.
            return Err(EngineError::new(format!("mock: open refused for {target:?}")));
        }
        self.state
            .opened_targets
            .lock()
            .expect("mock state lock")
            .push(target.to_owned());
        self.state.databases_live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDatabase {
            state: Arc::clone(&self.state),
            fail_connect: self.fail_connect.load(Ordering::SeqCst),
            _config: *config,
            released: false,
        }))
    }
}

/// Configuration fake; applied options land in the shared [`MockState`].
#[derive(Debug)]
pub struct MockConfig {
    state: Arc<MockState>,
    rejected: Vec<String>,
    released: bool,
}

impl EngineConfig for MockConfig {
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        if self.rejected.iter().any(|k| k == name) {
            return Err(EngineError::new(format!("mock: option {name:?} rejected")));
        }
        self.state
            .options_applied
            .lock()
            .expect("mock state lock")
            .push((name.to_owned(), value.to_owned()));
        Ok(())
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Drop for MockConfig {
    fn drop(&mut self) {
        assert!(!self.released, "mock config released twice");
        self.released = true;
        self.state.configs_live.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MockDatabase {
    state: Arc<MockState>,
    fail_connect: bool,
    // Owned for the database's lifetime; released together with it.
    _config: MockConfig,
    released: bool,
}

impl EngineDatabase for MockDatabase {
    fn connect(&self) -> Result<Box<dyn EngineConnection>, EngineError> {
        if self.fail_connect {
            return Err(EngineError::new("mock: connect refused"));
        }
        self.state.connections_live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
            released: false,
        }))
    }
}

impl Drop for MockDatabase {
    fn drop(&mut self) {
        assert!(!self.released, "mock database released twice");
        self.released = true;
        self.state.databases_live.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MockConnection {
    state: Arc<MockState>,
    released: bool,
}

impl EngineConnection for MockConnection {
    fn execute_batch(&mut self, sql: &str) -> Result<(), EngineError> {
        if sql.contains("SYNTAX ERROR") {
            return Err(EngineError::new("mock: statement rejected"));
        }
        self.state
            .executed_sql
            .lock()
            .expect("mock state lock")
            .push(sql.to_owned());
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        assert!(!self.released, "mock connection released twice");
        self.released = true;
        self.state.connections_live.fetch_sub(1, Ordering::SeqCst);
    }
}
