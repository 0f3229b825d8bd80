#![cfg(feature = "test-utils")]

use std::sync::Arc;

use sql_embedded_driver::driver;
use sql_embedded_driver::prelude::*;
use sql_embedded_driver::test_utils::MockEngine;

fn driver_for(engine: &Arc<MockEngine>) -> Driver {
    Driver::new(Arc::clone(engine) as Arc<dyn Engine>)
}

#[test]
fn registration_is_write_once_per_name() {
    let engine = MockEngine::new();

    driver::register("mock-write-once", driver_for(&engine)).unwrap();
    let err = driver::register("mock-write-once", driver_for(&engine)).unwrap_err();
    assert!(matches!(err, DriverError::AlreadyRegistered(name) if name == "mock-write-once"));

    // The original registration is still intact.
    driver::lookup("mock-write-once").unwrap();
}

#[test]
fn unknown_driver_lookup_fails() {
    let err = driver::lookup("never-registered").unwrap_err();
    assert!(matches!(err, DriverError::UnknownDriver(name) if name == "never-registered"));
}

#[test]
fn registry_open_produces_a_usable_connection() {
    let engine = MockEngine::new();
    let state = engine.state();

    driver::register("mock-registry-open", driver_for(&engine)).unwrap();
    let mut conn = driver::open("mock-registry-open", "mem.db?threads=2").unwrap();
    conn.execute_batch("PRAGMA user_version = 3;").unwrap();
    assert_eq!(state.opened_targets(), vec!["mem.db".to_owned()]);
}

#[test]
fn one_shot_open_releases_the_engine_when_the_connection_drops() {
    let engine = MockEngine::new();
    let state = engine.state();

    let conn = driver_for(&engine).open("mem.db").unwrap();
    assert_eq!(state.databases_live(), 1);
    assert_eq!(state.connections_live(), 1);

    drop(conn);
    assert!(state.all_released());
}

#[test]
fn one_shot_open_propagates_connector_errors() {
    let engine = MockEngine::new();
    let state = engine.state();
    engine.fail_open(true);

    let err = driver_for(&engine).open("mem.db").unwrap_err();
    assert!(matches!(err, DriverError::Open(_)));
    assert!(state.all_released());
}
