//! Retention sweeper: physical garbage collection of tombstones.
//!
//! # Responsibility
//! - Remove tombstones older than a cutoff in bounded batches.
//! - Report pending work without deleting (dry run).
//!
//! # Invariants
//! - Each table is swept in its own transaction; a failure on one table
//!   leaves earlier tables swept.
//! - Never part of a request-path transaction.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::model::ident::EntityKind;
use crate::repo::retention_repo::{tables_for, SqliteRetentionRepository};
use log::info;
use rusqlite::Connection;

/// Rows removed per entity kind by one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub per_kind: Vec<(EntityKind, usize)>,
}

impl SweepSummary {
    pub fn total(&self) -> usize {
        self.per_kind.iter().map(|(_, removed)| removed).sum()
    }

    pub fn removed(&self, kind: EntityKind) -> usize {
        self.per_kind
            .iter()
            .find(|(swept, _)| *swept == kind)
            .map_or(0, |(_, removed)| *removed)
    }
}

pub struct RetentionSweeper<'conn> {
    repo: SqliteRetentionRepository<'conn>,
    config: StoreConfig,
}

impl<'conn> RetentionSweeper<'conn> {
    pub fn try_new(conn: &'conn Connection, config: StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            repo: SqliteRetentionRepository::try_new(conn)?,
            config,
        })
    }

    /// Deletes up to `limit` rows per table of `kind` whose tombstone is
    /// older than `cutoff_ms`. Returns the total removed.
    pub fn sweep(&self, kind: EntityKind, cutoff_ms: i64, limit: u32) -> StoreResult<usize> {
        if limit == 0 {
            return Err(StoreError::Invalid(
                "sweep limit must be greater than zero".to_string(),
            ));
        }

        let mut removed = 0;
        for &table in tables_for(kind) {
            let deleted = self.repo.delete_expired(table, cutoff_ms, limit)?;
            info!(
                "event=retention_sweep module=service status=ok kind={} table={} cutoff_ms={} deleted={}",
                kind, table, cutoff_ms, deleted
            );
            removed += deleted;
        }
        Ok(removed)
    }

    /// Sweeps every entity kind.
    pub fn sweep_all(&self, cutoff_ms: i64, limit: u32) -> StoreResult<SweepSummary> {
        let mut summary = SweepSummary::default();
        for kind in EntityKind::ALL {
            let removed = self.sweep(kind, cutoff_ms, limit)?;
            summary.per_kind.push((kind, removed));
        }
        Ok(summary)
    }

    /// Counts rows of `kind` a sweep with `cutoff_ms` would remove.
    pub fn pending(&self, kind: EntityKind, cutoff_ms: i64) -> StoreResult<usize> {
        let mut pending = 0;
        for &table in tables_for(kind) {
            pending += self.repo.count_expired(table, cutoff_ms)?;
        }
        Ok(pending)
    }

    /// Sweeps every kind using the configured retention window and batch size.
    pub fn sweep_expired(&self, now_ms: i64) -> StoreResult<SweepSummary> {
        let cutoff_ms = self.config.retention_cutoff(now_ms);
        self.sweep_all(cutoff_ms, self.config.sweep_batch_limit)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}
