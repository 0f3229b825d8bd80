#![cfg(feature = "sqlite")]

use std::sync::Arc;

use sql_embedded_driver::prelude::*;
use sql_embedded_driver::{driver, register_sqlite};
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

#[test]
fn file_database_is_shared_across_connections() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("shared");
    let connector = Driver::sqlite().open_connector(&format!("{path}?journal_mode=WAL"))?;

    let mut writer = connector.connect()?;
    writer.execute_batch(
        "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         INSERT INTO items (id, name) VALUES (1, 'first');",
    )?;

    // A second connection against the same handle sees the table.
    let mut reader = connector.connect()?;
    reader.execute_batch("INSERT INTO items (id, name) VALUES (2, 'second');")?;

    drop((writer, reader));
    connector.close()?;
    Ok(())
}

#[test]
fn memory_target_is_shared_across_connections() -> Result<(), Box<dyn std::error::Error>> {
    let connector = Driver::sqlite().open_connector(":memory:")?;

    let mut a = connector.connect()?;
    a.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);")?;

    let mut b = connector.connect()?;
    b.execute_batch("INSERT INTO t (id) VALUES (42);")?;

    drop((a, b));
    connector.close()?;
    Ok(())
}

#[test]
fn separate_memory_handles_are_independent() -> Result<(), Box<dyn std::error::Error>> {
    let first = Driver::sqlite().open_connector(":memory:")?;
    let second = Driver::sqlite().open_connector(":memory:")?;

    first
        .connect()?
        .execute_batch("CREATE TABLE only_here (id INTEGER);")?;

    // The second handle must not see the first handle's schema.
    let err = second
        .connect()?
        .execute_batch("INSERT INTO only_here (id) VALUES (1);")
        .unwrap_err();
    assert!(matches!(err, DriverError::Execution(_)));

    first.close()?;
    second.close()?;
    Ok(())
}

#[test]
fn unknown_option_fails_at_set_time() {
    let err = Driver::sqlite()
        .open_connector("x.db?not_an_option=1")
        .unwrap_err();
    match err {
        DriverError::ConfigSet { key, value, .. } => {
            assert_eq!(key, "not_an_option");
            assert_eq!(value, "1");
        }
        other => panic!("expected ConfigSet, got {other:?}"),
    }
}

#[test]
fn bad_option_value_fails_at_set_time() {
    let err = Driver::sqlite()
        .open_connector("x.db?access_mode=SIDEWAYS")
        .unwrap_err();
    assert!(matches!(err, DriverError::ConfigSet { key, .. } if key == "access_mode"));

    let err = Driver::sqlite()
        .open_connector("x.db?threads=many")
        .unwrap_err();
    assert!(matches!(err, DriverError::ConfigSet { key, .. } if key == "threads"));
}

#[test]
fn read_only_open_of_a_missing_file_fails() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("missing.db");
    let err = Driver::sqlite()
        .open_connector(&format!("{}?access_mode=READ_ONLY", path.display()))
        .unwrap_err();
    assert!(matches!(err, DriverError::Open(_)));
}

#[test]
fn read_only_connection_refuses_writes() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("readonly");

    // Seed the file through a read/write handle first.
    let seed = Driver::sqlite().open_connector(&path)?;
    seed.connect()?
        .execute_batch("CREATE TABLE t (id INTEGER);")?;
    seed.close()?;

    let connector = Driver::sqlite().open_connector(&format!("{path}?access_mode=READ_ONLY"))?;
    let err = connector
        .connect()?
        .execute_batch("INSERT INTO t (id) VALUES (1);")
        .unwrap_err();
    assert!(matches!(err, DriverError::Execution(_)));
    connector.close()?;
    Ok(())
}

#[test]
fn init_hook_applies_session_pragmas() -> Result<(), Box<dyn std::error::Error>> {
    let path = unique_db_path("hooked");
    let connector = Driver::sqlite().open_connector_with_init(
        &path,
        Arc::new(|conn: &mut Connection| {
            conn.execute_batch("PRAGMA busy_timeout = 5000; PRAGMA user_version = 9;")
        }),
    )?;

    let mut conn = connector.connect()?;
    conn.execute_batch("CREATE TABLE hooked (id INTEGER);")?;
    drop(conn);
    connector.close()?;
    Ok(())
}

#[test]
fn statement_errors_surface_as_execution_errors() -> Result<(), Box<dyn std::error::Error>> {
    let connector = Driver::sqlite().open_connector(":memory:")?;
    let err = connector
        .connect()?
        .execute_batch("THIS IS NOT SQL;")
        .unwrap_err();
    assert!(matches!(err, DriverError::Execution(_)));
    connector.close()?;
    Ok(())
}

#[test]
fn sqlite_driver_registers_under_its_fixed_name() -> Result<(), Box<dyn std::error::Error>> {
    register_sqlite()?;
    assert!(matches!(
        register_sqlite().unwrap_err(),
        DriverError::AlreadyRegistered(name) if name == SQLITE_DRIVER_NAME
    ));

    let mut conn = driver::open(SQLITE_DRIVER_NAME, ":memory:?foreign_keys=on")?;
    conn.execute_batch("CREATE TABLE r (id INTEGER);")?;
    Ok(())
}
