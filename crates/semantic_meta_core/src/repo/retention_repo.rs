//! Physical removal of expired tombstones.
//!
//! # Invariants
//! - Live rows (`deleted_at = 0`) are never touched.
//! - One call removes at most `limit` rows of one table, oldest first.

use super::ensure_connection_ready;
use crate::db::SqliteExecutor;
use crate::error::StoreResult;
use crate::model::ident::EntityKind;
use rusqlite::{params, Connection};

/// Tables holding tombstones of `kind`, swept independently.
pub fn tables_for(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Metric => &["metric_meta", "metric_version_meta"],
        EntityKind::WordRoot => &["word_root_meta"],
        EntityKind::ValueDomain => &["value_domain_meta"],
        EntityKind::Modifier => &["metric_modifier_meta"],
        EntityKind::Unit => &["unit_meta"],
    }
}

/// Tombstone access for the retention sweeper.
pub struct SqliteRetentionRepository<'conn> {
    executor: SqliteExecutor<'conn>,
}

impl<'conn> SqliteRetentionRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        for kind in EntityKind::ALL {
            for &table in tables_for(kind) {
                ensure_connection_ready(conn, table, &["deleted_at"])?;
            }
        }
        Ok(Self {
            executor: SqliteExecutor::new(conn),
        })
    }

    /// Deletes up to `limit` rows of `table` tombstoned before `cutoff_ms`
    /// in one transaction. Returns the number removed.
    pub fn delete_expired(
        &self,
        table: &'static str,
        cutoff_ms: i64,
        limit: u32,
    ) -> StoreResult<usize> {
        // No `DELETE ... LIMIT` in default SQLite builds.
        let sql = format!(
            "DELETE FROM {table}
             WHERE rowid IN (
                 SELECT rowid FROM {table}
                 WHERE deleted_at > 0 AND deleted_at < ?1
                 ORDER BY deleted_at ASC
                 LIMIT ?2
             );"
        );
        self.executor
            .run_write(|tx| Ok(tx.execute(&sql, params![cutoff_ms, i64::from(limit)])?))
    }

    /// Counts rows of `table` a sweep with `cutoff_ms` would remove.
    pub fn count_expired(&self, table: &'static str, cutoff_ms: i64) -> StoreResult<usize> {
        self.executor.run_read(|conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE deleted_at > 0 AND deleted_at < ?1;"),
                [cutoff_ms],
                |row| row.get(0),
            )?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }
}
