//! Configuration builder: turns a parsed DSN into an engine configuration
//! object, seeding the fixed driver-identity option before caller options.

use tracing::debug;

use crate::dsn::Dsn;
use crate::engine::{Engine, EngineConfig};
use crate::error::DriverError;

/// Option key every configuration carries so the engine can attribute the
/// API origin of the session.
pub const DRIVER_API_OPTION: &str = "driver_api";

/// Value set for [`DRIVER_API_OPTION`].
pub const DRIVER_API_VALUE: &str = "rust";

/// Build a configuration object from the DSN's query options.
///
/// The identity option is applied first, then each query option in order, so
/// a caller-supplied `driver_api` overrides the seeded value. On any failure
/// the partially built configuration is dropped before the error returns;
/// no engine resource outlives an error from this function.
///
/// # Errors
/// Returns `DriverError::ConfigCreate` if allocation fails and
/// `DriverError::ConfigSet` for the first option the engine rejects.
pub fn prepare_config(
    engine: &dyn Engine,
    dsn: &Dsn,
) -> Result<Box<dyn EngineConfig>, DriverError> {
    let mut config = engine.create_config().map_err(DriverError::ConfigCreate)?;

    set_option(config.as_mut(), DRIVER_API_OPTION, DRIVER_API_VALUE)?;

    for (key, value) in dsn.options() {
        set_option(config.as_mut(), key, value)?;
    }

    debug!(
        engine = engine.name(),
        options = dsn.options().len(),
        "configuration prepared"
    );
    Ok(config)
}

fn set_option(config: &mut dyn EngineConfig, key: &str, value: &str) -> Result<(), DriverError> {
    config
        .set_option(key, value)
        .map_err(|source| DriverError::ConfigSet {
            key: key.to_owned(),
            value: value.to_owned(),
            source,
        })
}
