use rusqlite::Connection;
use semantic_meta_core::db::migrations::{current_user_version, latest_version};
use semantic_meta_core::db::{open_db, open_db_in_memory, open_db_with_config, DbError};
use semantic_meta_core::{SqliteMetricRepository, SqliteNamespaceResolver, StoreConfig, StoreError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    for table in [
        "metalake_meta",
        "catalog_meta",
        "schema_meta",
        "word_root_meta",
        "value_domain_meta",
        "metric_modifier_meta",
        "metric_meta",
        "metric_version_meta",
        "unit_meta",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("semantic_meta.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn_first).unwrap(), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "metric_version_meta");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_keys_are_enabled_on_open() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO catalog_meta (catalog_id, metalake_id, catalog_name) VALUES (1, 404, 'dw');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().to_lowercase().contains("foreign key"));
}

#[test]
fn configured_busy_timeout_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        busy_timeout_ms: 1_234,
        ..StoreConfig::default()
    };
    let conn = open_db_with_config(dir.path().join("busy.db"), &config).unwrap();
    let timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 1_234);
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    let resolver = SqliteNamespaceResolver::new(&conn);
    let err = SqliteMetricRepository::try_new(&conn, resolver)
        .err()
        .unwrap();
    match err {
        StoreError::Persistence(DbError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn metric_pointer_check_constraint_rejects_inverted_versions() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO metalake_meta (metalake_id, metalake_name) VALUES (1, 'lake');
         INSERT INTO catalog_meta (catalog_id, metalake_id, catalog_name) VALUES (2, 1, 'dw');
         INSERT INTO schema_meta (schema_id, metalake_id, catalog_id, schema_name)
             VALUES (3, 1, 2, 'sales');",
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO metric_meta (
            metric_id, metric_code, metric_name, metric_type,
            metalake_id, catalog_id, schema_id,
            current_version, last_version, audit_info
        ) VALUES (10, 'REVENUE', 'revenue', 'ATOMIC', 1, 2, 3, 3, 2, '{}');",
        [],
    );
    assert!(result.is_err());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
