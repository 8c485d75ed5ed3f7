//! Ordered schema steps for the metadata store.
//!
//! # Invariants
//! - Steps are numbered contiguously from 1; the applied step is mirrored
//!   to `PRAGMA user_version`.
//! - All pending steps commit together or not at all.
//! - A database migrated by a newer build is never touched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// One schema step: `(user_version after apply, label, sql)`.
type SchemaStep = (u32, &'static str, &'static str);

const SCHEMA_STEPS: &[SchemaStep] = &[
    (1, "namespaces", include_str!("0001_namespaces.sql")),
    (2, "simple_entities", include_str!("0002_simple_entities.sql")),
    (3, "metrics", include_str!("0003_metrics.sql")),
    (4, "units", include_str!("0004_units.sql")),
];

/// Schema version this build migrates to.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _, _)| *version)
}

/// Brings `conn` up to `latest_version()`.
///
/// The version is re-read after the write lock is taken, so two
/// connections opening the same fresh file apply each step once.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    let observed = current_user_version(conn)?;
    check_supported(observed, latest)?;
    if observed == latest {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let applied = current_user_version(&tx)?;
    check_supported(applied, latest)?;

    for (version, label, sql) in SCHEMA_STEPS.iter().filter(|(v, _, _)| *v > applied) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        info!(
            "event=db_migrate module=db status=ok version={} step={}",
            version, label
        );
    }
    tx.commit()?;
    Ok(())
}

/// Reads the applied schema version of a connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

fn check_supported(db_version: u32, latest_supported: u32) -> DbResult<()> {
    if db_version > latest_supported {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        });
    }
    Ok(())
}
