//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define entity store contracts for simple and versioned entities.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories validate codes and resolve namespaces before any write.
//! - Repositories only see live rows unless an operation says otherwise.
//! - Every optimistic update compares `row_version`.

pub mod metric_repo;
pub mod retention_repo;
pub mod simple_repo;
pub mod simple_tables;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::error::{StoreError, StoreResult};
use crate::model::ident::validate_code;
use crate::model::CatalogEntity;
use rusqlite::Connection;

/// Upper bound applied to every page size.
pub const MAX_LIST_LIMIT: u32 = 500;

/// Paging parameters for namespace listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub offset: u32,
    /// `None` returns every remaining row.
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn page(offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    /// SQLite `LIMIT` value; `-1` means unbounded.
    pub(crate) fn sql_limit(&self) -> i64 {
        self.limit
            .map_or(-1, |limit| i64::from(limit.min(MAX_LIST_LIMIT)))
    }
}

/// Rejects mutations that change the identity or location of an entity.
pub(crate) fn check_candidate_identity<E: CatalogEntity>(
    snapshot: &E,
    candidate: &E,
) -> StoreResult<()> {
    if candidate.id() != snapshot.id() {
        return Err(StoreError::Invalid(format!(
            "{} id must not change on update: {} -> {}",
            E::KIND,
            snapshot.id(),
            candidate.id()
        )));
    }
    if candidate.namespace() != snapshot.namespace() {
        return Err(StoreError::Invalid(format!(
            "{} namespace must not change on update: {} -> {}",
            E::KIND,
            snapshot.namespace(),
            candidate.namespace()
        )));
    }
    validate_code(E::KIND, candidate.code())
}

/// Verifies the connection is migrated and `table` carries `columns`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(DbError::UninitializedConnection {
            expected_version,
            actual_version,
        }
        .into());
    }

    if !table_exists(conn, table)? {
        return Err(DbError::MissingRequiredTable(table).into());
    }

    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(DbError::MissingRequiredColumn { table, column }.into());
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{ensure_connection_ready, ListQuery, MAX_LIST_LIMIT};
    use crate::db::open_db_in_memory;
    use crate::error::StoreError;
    use rusqlite::Connection;

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(ListQuery::page(0, 10_000).sql_limit(), i64::from(MAX_LIST_LIMIT));
        assert_eq!(ListQuery::page(0, 5).sql_limit(), 5);
        assert_eq!(ListQuery::default().sql_limit(), -1);
    }

    #[test]
    fn unmigrated_connection_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let err = ensure_connection_ready(&conn, "metric_meta", &["metric_id"]).unwrap_err();
        assert_eq!(err.code(), "persistence");
    }

    #[test]
    fn missing_column_is_reported() {
        let conn = open_db_in_memory().unwrap();
        ensure_connection_ready(&conn, "metric_meta", &["metric_id", "row_version"]).unwrap();
        let err = ensure_connection_ready(&conn, "metric_meta", &["no_such_column"]).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
    }
}
