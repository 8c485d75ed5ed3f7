//! Entity store for unversioned schema-scoped entities.
//!
//! # Responsibility
//! - Insert, read, list, update and soft-delete word roots, value domains,
//!   metric modifiers and units through one generic implementation.
//! - Translate unique-index violations into `AlreadyExists`.
//!
//! # Invariants
//! - Updates are optimistic: the `row_version` read with the snapshot must
//!   still match when the update lands, else `Conflict`.
//! - The mutation closure runs outside any transaction.
//! - Overwrite inserts keep the id of the live row they replace.

use super::simple_tables::SimpleEntityTable;
use super::{check_candidate_identity, ensure_connection_ready, ListQuery};
use crate::db::{now_epoch_ms, SqliteExecutor};
use crate::error::{translate_write_error, StoreError, StoreResult};
use crate::model::audit::AuditInfo;
use crate::model::ident::{validate_code, EntityId, NameIdentifier, Namespace};
use crate::model::simple::{MetricModifier, Unit, ValueDomain, WordRoot};
use crate::namespace::NamespaceResolver;
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::marker::PhantomData;

/// Store contract for one unversioned entity kind.
pub trait SimpleEntityRepository<E> {
    /// Persists `candidate`; with `overwrite` an existing live row of the
    /// same code is replaced in place.
    fn insert(&self, candidate: &E, overwrite: bool) -> StoreResult<E>;
    /// Loads one live entity.
    fn get(&self, ident: &NameIdentifier) -> StoreResult<E>;
    /// Lists live entities of one schema ordered by id.
    fn list_by_namespace(&self, namespace: &Namespace, query: ListQuery) -> StoreResult<Vec<E>>;
    /// Counts live entities of one schema.
    fn count_by_namespace(&self, namespace: &Namespace) -> StoreResult<u64>;
    /// Applies `mutate` to the current state and persists the result.
    fn update<F>(&self, ident: &NameIdentifier, mutate: F) -> StoreResult<E>
    where
        F: FnOnce(E) -> E;
    /// Tombstones the live entity; `false` when nothing matched.
    fn soft_delete(&self, ident: &NameIdentifier) -> StoreResult<bool>;
}

/// SQLite-backed store shared by every `SimpleEntityTable` kind.
pub struct SqliteSimpleEntityRepository<'conn, E, R> {
    executor: SqliteExecutor<'conn>,
    resolver: R,
    _entity: PhantomData<fn() -> E>,
}

pub type WordRootRepository<'conn, R> = SqliteSimpleEntityRepository<'conn, WordRoot, R>;
pub type ValueDomainRepository<'conn, R> = SqliteSimpleEntityRepository<'conn, ValueDomain, R>;
pub type ModifierRepository<'conn, R> = SqliteSimpleEntityRepository<'conn, MetricModifier, R>;
pub type UnitRepository<'conn, R> = SqliteSimpleEntityRepository<'conn, Unit, R>;

impl<'conn, E, R> SqliteSimpleEntityRepository<'conn, E, R>
where
    E: SimpleEntityTable,
    R: NamespaceResolver,
{
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection, resolver: R) -> StoreResult<Self> {
        let mut columns = vec![E::ID_COLUMN, E::CODE_COLUMN, E::NAME_COLUMN];
        columns.extend_from_slice(E::DATA_COLUMNS);
        columns.extend_from_slice(&["schema_id", "audit_info", "row_version", "deleted_at"]);
        ensure_connection_ready(conn, E::TABLE, &columns)?;

        Ok(Self {
            executor: SqliteExecutor::new(conn),
            resolver,
            _entity: PhantomData,
        })
    }

    fn select_sql(filter: &str) -> String {
        let mut columns = vec![E::ID_COLUMN, E::CODE_COLUMN, E::NAME_COLUMN];
        columns.extend_from_slice(E::DATA_COLUMNS);
        columns.extend_from_slice(&["audit_info", "row_version"]);
        format!(
            "SELECT {} FROM {} WHERE {filter}",
            columns.join(", "),
            E::TABLE
        )
    }

    /// Reads one live row and its `row_version`.
    fn load_live(
        &self,
        conn: &Connection,
        schema_id: EntityId,
        ident: &NameIdentifier,
    ) -> StoreResult<Option<(E, i64)>> {
        let sql = Self::select_sql(&format!(
            "schema_id = ?1 AND {} = ?2 AND deleted_at = 0;",
            E::CODE_COLUMN
        ));
        let audit_index = 3 + E::DATA_COLUMNS.len();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![schema_id, ident.code()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let audit_json: String = row.get(audit_index)?;
        let row_version: i64 = row.get(audit_index + 1)?;
        let audit = AuditInfo::from_json(&audit_json)?;
        let entity = E::from_row(row, ident.namespace().clone(), audit)?;
        Ok(Some((entity, row_version)))
    }

    fn require_live(&self, schema_id: EntityId, ident: &NameIdentifier) -> StoreResult<(E, i64)> {
        self.load_live(self.executor.connection(), schema_id, ident)?
            .ok_or_else(|| StoreError::not_found(E::KIND.as_str(), ident.to_string()))
    }
}

impl<E, R> SimpleEntityRepository<E> for SqliteSimpleEntityRepository<'_, E, R>
where
    E: SimpleEntityTable,
    R: NamespaceResolver,
{
    fn insert(&self, candidate: &E, overwrite: bool) -> StoreResult<E> {
        validate_code(E::KIND, candidate.code())?;
        let ids = self.resolver.resolve(candidate.namespace())?;
        let ident = candidate.name_identifier();

        let mut columns = vec![E::ID_COLUMN, E::CODE_COLUMN, E::NAME_COLUMN];
        columns.extend_from_slice(E::DATA_COLUMNS);
        columns.extend_from_slice(&["metalake_id", "catalog_id", "schema_id", "audit_info"]);

        let mut values = vec![
            Value::Integer(candidate.id()),
            Value::Text(candidate.code().to_string()),
            Value::Text(candidate.name().to_string()),
        ];
        values.extend(candidate.data_values());
        values.extend([
            Value::Integer(ids.metalake_id),
            Value::Integer(ids.catalog_id),
            Value::Integer(ids.schema_id),
            Value::Text(candidate.audit().to_json()?),
        ]);

        let placeholders = (1..=values.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            E::TABLE,
            columns.join(", ")
        );
        if overwrite {
            let mut assignments = vec![format!("{0} = excluded.{0}", E::NAME_COLUMN)];
            assignments.extend(
                E::DATA_COLUMNS
                    .iter()
                    .map(|column| format!("{column} = excluded.{column}")),
            );
            assignments.push("audit_info = excluded.audit_info".to_string());
            assignments.push("row_version = row_version + 1".to_string());
            sql.push_str(&format!(
                " ON CONFLICT (schema_id, {}) WHERE deleted_at = 0 DO UPDATE SET {}",
                E::CODE_COLUMN,
                assignments.join(", ")
            ));
        }
        sql.push(';');

        self.executor.run_write(|tx| {
            tx.execute(&sql, params_from_iter(values.iter()))
                .map_err(|err| translate_write_error(err, E::KIND.as_str(), &ident.to_string()))?;
            self.load_live(tx, ids.schema_id, &ident)?
                .map(|(stored, _)| stored)
                .ok_or_else(|| StoreError::not_found(E::KIND.as_str(), ident.to_string()))
        })
    }

    fn get(&self, ident: &NameIdentifier) -> StoreResult<E> {
        let ids = self.resolver.resolve(ident.namespace())?;
        self.require_live(ids.schema_id, ident)
            .map(|(entity, _)| entity)
    }

    fn list_by_namespace(&self, namespace: &Namespace, query: ListQuery) -> StoreResult<Vec<E>> {
        let ids = self.resolver.resolve(namespace)?;
        let sql = Self::select_sql(&format!(
            "schema_id = ?1 AND deleted_at = 0 ORDER BY {} ASC LIMIT ?2 OFFSET ?3;",
            E::ID_COLUMN
        ));
        let audit_index = 3 + E::DATA_COLUMNS.len();

        self.executor.run_read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![
                ids.schema_id,
                query.sql_limit(),
                i64::from(query.offset)
            ])?;
            let mut entities = Vec::new();
            while let Some(row) = rows.next()? {
                let audit_json: String = row.get(audit_index)?;
                let audit = AuditInfo::from_json(&audit_json)?;
                entities.push(E::from_row(row, namespace.clone(), audit)?);
            }
            Ok(entities)
        })
    }

    fn count_by_namespace(&self, namespace: &Namespace) -> StoreResult<u64> {
        let ids = self.resolver.resolve(namespace)?;
        self.executor.run_read(|conn| {
            let count: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE schema_id = ?1 AND deleted_at = 0;",
                    E::TABLE
                ),
                [ids.schema_id],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
    }

    fn update<F>(&self, ident: &NameIdentifier, mutate: F) -> StoreResult<E>
    where
        F: FnOnce(E) -> E,
    {
        let ids = self.resolver.resolve(ident.namespace())?;
        let (snapshot, row_version) = self.require_live(ids.schema_id, ident)?;

        let candidate = mutate(snapshot.clone());
        check_candidate_identity(&snapshot, &candidate)?;

        let mut assignments = vec![
            format!("{} = ?1", E::CODE_COLUMN),
            format!("{} = ?2", E::NAME_COLUMN),
        ];
        let mut values = vec![
            Value::Text(candidate.code().to_string()),
            Value::Text(candidate.name().to_string()),
        ];
        for (column, value) in E::DATA_COLUMNS.iter().zip(candidate.data_values()) {
            values.push(value);
            assignments.push(format!("{column} = ?{}", values.len()));
        }
        values.push(Value::Text(candidate.audit().to_json()?));
        assignments.push(format!("audit_info = ?{}", values.len()));
        assignments.push("row_version = row_version + 1".to_string());

        values.push(Value::Integer(snapshot.id()));
        let id_index = values.len();
        values.push(Value::Integer(row_version));
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{id_index} AND row_version = ?{} AND deleted_at = 0;",
            E::TABLE,
            assignments.join(", "),
            E::ID_COLUMN,
            values.len()
        );

        let renamed = candidate.name_identifier();
        let updated = self.executor.run_write(|tx| {
            tx.execute(&sql, params_from_iter(values.iter()))
                .map_err(|err| translate_write_error(err, E::KIND.as_str(), &renamed.to_string()))
        })?;
        if updated == 0 {
            debug!(
                "event=entity_update module=repo status=conflict kind={} name={}",
                E::KIND,
                ident
            );
            return Err(StoreError::conflict(E::KIND.as_str(), ident.to_string()));
        }

        Ok(candidate)
    }

    fn soft_delete(&self, ident: &NameIdentifier) -> StoreResult<bool> {
        let ids = match self.resolver.resolve(ident.namespace()) {
            Ok(ids) => ids,
            Err(err @ StoreError::NotFound { .. }) => {
                warn!(
                    "event=entity_delete module=repo status=skipped kind={} name={} error={}",
                    E::KIND,
                    ident,
                    err
                );
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        let deleted_at = now_epoch_ms();
        let changed = self.executor.run_write(|tx| {
            Ok(tx.execute(
                &format!(
                    "UPDATE {} SET deleted_at = ?1
                     WHERE schema_id = ?2 AND {} = ?3 AND deleted_at = 0;",
                    E::TABLE,
                    E::CODE_COLUMN
                ),
                params![deleted_at, ids.schema_id, ident.code()],
            )?)
        })?;
        Ok(changed > 0)
    }
}
