//! Namespace resolution: metalake/catalog/schema names to numeric ids.
//!
//! # Responsibility
//! - Map a `Namespace` to the live parent ids stored on entity rows.
//! - Register namespace chains so stores are usable on a fresh database.
//!
//! # Invariants
//! - Only live (`deleted_at = 0`) namespace rows resolve.
//! - Resolution failure names the first missing level.

use crate::db::SqliteExecutor;
use crate::error::{StoreError, StoreResult};
use crate::model::ident::{generate_entity_id, EntityId, Namespace, ParentIds};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// Resolves a namespace to the ids of its parent chain.
pub trait NamespaceResolver {
    fn resolve(&self, namespace: &Namespace) -> StoreResult<ParentIds>;
}

impl<T: NamespaceResolver + ?Sized> NamespaceResolver for &T {
    fn resolve(&self, namespace: &Namespace) -> StoreResult<ParentIds> {
        (**self).resolve(namespace)
    }
}

/// SQLite resolver over `metalake_meta`, `catalog_meta` and `schema_meta`.
#[derive(Clone, Copy)]
pub struct SqliteNamespaceResolver<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNamespaceResolver<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates any missing level of `namespace` and returns its ids.
    ///
    /// Idempotent: existing live levels are reused.
    pub fn ensure_namespace(&self, namespace: &Namespace) -> StoreResult<ParentIds> {
        SqliteExecutor::new(self.conn).run_write(|tx| {
            let metalake_id = match find_metalake(tx, namespace.metalake())? {
                Some(id) => id,
                None => {
                    let id = generate_entity_id();
                    tx.execute(
                        "INSERT INTO metalake_meta (metalake_id, metalake_name) VALUES (?1, ?2);",
                        params![id, namespace.metalake()],
                    )?;
                    id
                }
            };
            let catalog_id = match find_catalog(tx, metalake_id, namespace.catalog())? {
                Some(id) => id,
                None => {
                    let id = generate_entity_id();
                    tx.execute(
                        "INSERT INTO catalog_meta (catalog_id, metalake_id, catalog_name)
                         VALUES (?1, ?2, ?3);",
                        params![id, metalake_id, namespace.catalog()],
                    )?;
                    id
                }
            };
            let schema_id = match find_schema(tx, catalog_id, namespace.schema())? {
                Some(id) => id,
                None => {
                    let id = generate_entity_id();
                    tx.execute(
                        "INSERT INTO schema_meta (schema_id, metalake_id, catalog_id, schema_name)
                         VALUES (?1, ?2, ?3, ?4);",
                        params![id, metalake_id, catalog_id, namespace.schema()],
                    )?;
                    info!(
                        "event=namespace_register module=namespace status=ok namespace={}",
                        namespace
                    );
                    id
                }
            };
            Ok(ParentIds {
                metalake_id,
                catalog_id,
                schema_id,
            })
        })
    }
}

impl NamespaceResolver for SqliteNamespaceResolver<'_> {
    fn resolve(&self, namespace: &Namespace) -> StoreResult<ParentIds> {
        let metalake_id = find_metalake(self.conn, namespace.metalake())?
            .ok_or_else(|| StoreError::not_found("metalake", namespace.metalake()))?;
        let catalog_id = find_catalog(self.conn, metalake_id, namespace.catalog())?
            .ok_or_else(|| {
                StoreError::not_found(
                    "catalog",
                    format!("{}.{}", namespace.metalake(), namespace.catalog()),
                )
            })?;
        let schema_id = find_schema(self.conn, catalog_id, namespace.schema())?
            .ok_or_else(|| StoreError::not_found("schema", namespace.to_string()))?;

        Ok(ParentIds {
            metalake_id,
            catalog_id,
            schema_id,
        })
    }
}

fn find_metalake(conn: &Connection, name: &str) -> StoreResult<Option<EntityId>> {
    Ok(conn
        .query_row(
            "SELECT metalake_id FROM metalake_meta
             WHERE metalake_name = ?1 AND deleted_at = 0;",
            [name],
            |row| row.get(0),
        )
        .optional()?)
}

fn find_catalog(
    conn: &Connection,
    metalake_id: EntityId,
    name: &str,
) -> StoreResult<Option<EntityId>> {
    Ok(conn
        .query_row(
            "SELECT catalog_id FROM catalog_meta
             WHERE metalake_id = ?1 AND catalog_name = ?2 AND deleted_at = 0;",
            params![metalake_id, name],
            |row| row.get(0),
        )
        .optional()?)
}

fn find_schema(
    conn: &Connection,
    catalog_id: EntityId,
    name: &str,
) -> StoreResult<Option<EntityId>> {
    Ok(conn
        .query_row(
            "SELECT schema_id FROM schema_meta
             WHERE catalog_id = ?1 AND schema_name = ?2 AND deleted_at = 0;",
            params![catalog_id, name],
            |row| row.get(0),
        )
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::{NamespaceResolver, SqliteNamespaceResolver};
    use crate::db::open_db_in_memory;
    use crate::error::StoreError;
    use crate::model::ident::Namespace;

    #[test]
    fn ensure_is_idempotent_and_resolvable() {
        let conn = open_db_in_memory().unwrap();
        let resolver = SqliteNamespaceResolver::new(&conn);
        let ns = Namespace::new("lake", "dw", "sales").unwrap();

        let first = resolver.ensure_namespace(&ns).unwrap();
        let second = resolver.ensure_namespace(&ns).unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.resolve(&ns).unwrap(), first);
    }

    #[test]
    fn missing_level_is_reported_by_name() {
        let conn = open_db_in_memory().unwrap();
        let resolver = SqliteNamespaceResolver::new(&conn);
        resolver
            .ensure_namespace(&Namespace::new("lake", "dw", "sales").unwrap())
            .unwrap();

        let err = resolver
            .resolve(&Namespace::new("lake", "dw", "finance").unwrap())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { resource: "schema", .. }));

        let err = resolver
            .resolve(&Namespace::new("other", "dw", "sales").unwrap())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { resource: "metalake", .. }));
    }
}
