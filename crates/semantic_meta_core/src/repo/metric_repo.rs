//! Metric store with immutable version history.
//!
//! # Responsibility
//! - Persist metric entity rows together with their version rows.
//! - Decide, on update, whether a new version is allocated.
//! - Move the current-version pointer and tombstone whole histories.
//!
//! # Invariants
//! - An entity row and the version rows written with it commit together.
//! - `1 <= current_version <= last_version`; `last_version` never shrinks
//!   and version numbers are never reused.
//! - Every pointer or entity change is a `row_version` compare-and-swap.
//! - Reads only see live rows.

use super::{check_candidate_identity, ensure_connection_ready, ListQuery};
use crate::db::{now_epoch_ms, SqliteExecutor, WriteOp};
use crate::error::{is_unique_violation, translate_write_error, StoreError, StoreResult};
use crate::model::audit::AuditInfo;
use crate::model::ident::{
    validate_code, EntityId, EntityKind, NameIdentifier, Namespace, ParentIds,
    METRIC_VERSION_RESOURCE,
};
use crate::model::metric::{Metric, MetricType, MetricVersion, MetricVersionFields, SourceTableRef};
use crate::model::CatalogEntity;
use crate::namespace::NamespaceResolver;
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};

const METRIC: &str = "metric";

const METRIC_SELECT_SQL: &str = "SELECT
        m.metric_id,
        m.metric_code,
        m.metric_name,
        m.metric_type,
        m.data_type,
        m.metric_comment,
        m.current_version,
        m.last_version,
        m.audit_info,
        m.row_version,
        v.metric_unit,
        v.aggregation_logic,
        v.parent_metric_ids,
        v.calculation_formula,
        v.ref_catalog_name,
        v.ref_schema_name,
        v.ref_table_name,
        v.measure_columns,
        v.filter_columns
    FROM metric_meta m
    LEFT JOIN metric_version_meta v
        ON v.metric_id = m.metric_id
        AND v.version = m.current_version
        AND v.deleted_at = 0";

const VERSION_SELECT_SQL: &str = "SELECT
        metric_id,
        version,
        metric_name,
        metric_code,
        metric_type,
        data_type,
        metric_comment,
        audit_info,
        deleted_at,
        metric_unit,
        aggregation_logic,
        parent_metric_ids,
        calculation_formula,
        ref_catalog_name,
        ref_schema_name,
        ref_table_name,
        measure_columns,
        filter_columns
    FROM metric_version_meta";

/// Store contract for metrics and their versions.
pub trait MetricRepository {
    /// Inserts `candidate` with version 1 built from its embedded fields.
    fn insert(&self, candidate: &Metric, overwrite: bool) -> StoreResult<Metric>;
    /// Inserts `candidate` with version 1 carrying `fields`.
    ///
    /// With `overwrite`, an existing live metric of the same code keeps its
    /// id and gets version `last_version + 1`.
    fn insert_with_initial_version(
        &self,
        candidate: &Metric,
        overwrite: bool,
        fields: MetricVersionFields,
    ) -> StoreResult<Metric>;
    /// Loads one live metric with its current version fields.
    fn get(&self, ident: &NameIdentifier) -> StoreResult<Metric>;
    /// Lists live metrics of one schema ordered by id.
    fn list_by_namespace(&self, namespace: &Namespace, query: ListQuery)
        -> StoreResult<Vec<Metric>>;
    /// Counts live metrics of one schema.
    fn count_by_namespace(&self, namespace: &Namespace) -> StoreResult<u64>;
    /// Applies `mutate`; a change to version fields allocates a new version.
    fn update<F>(&self, ident: &NameIdentifier, mutate: F) -> StoreResult<Metric>
    where
        F: FnOnce(Metric) -> Metric;
    /// Points the metric at an existing live version.
    fn switch_current_version(&self, ident: &NameIdentifier, target: i32) -> StoreResult<Metric>;
    /// Tombstones the metric and every version row.
    fn delete(&self, ident: &NameIdentifier) -> StoreResult<bool>;
    /// Loads one live version of a live metric.
    fn get_version(&self, ident: &NameIdentifier, version: i32) -> StoreResult<MetricVersion>;
    /// Lists live versions ascending.
    fn list_versions(&self, ident: &NameIdentifier) -> StoreResult<Vec<MetricVersion>>;
    /// Tombstones one non-current version.
    fn delete_version(&self, ident: &NameIdentifier, version: i32) -> StoreResult<bool>;
    /// Codes of live metrics by id, `None` where absent; input order kept.
    fn metric_codes_by_ids(&self, ids: &[EntityId]) -> StoreResult<Vec<Option<String>>>;
}

/// SQLite-backed metric store.
pub struct SqliteMetricRepository<'conn, R> {
    executor: SqliteExecutor<'conn>,
    resolver: R,
}

impl<'conn, R: NamespaceResolver> SqliteMetricRepository<'conn, R> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection, resolver: R) -> StoreResult<Self> {
        ensure_connection_ready(
            conn,
            "metric_meta",
            &[
                "metric_id",
                "metric_code",
                "current_version",
                "last_version",
                "row_version",
                "deleted_at",
            ],
        )?;
        ensure_connection_ready(
            conn,
            "metric_version_meta",
            &["metric_id", "version", "parent_metric_ids", "deleted_at"],
        )?;

        Ok(Self {
            executor: SqliteExecutor::new(conn),
            resolver,
        })
    }

    fn require_live(
        &self,
        schema_id: EntityId,
        ident: &NameIdentifier,
    ) -> StoreResult<(Metric, i64)> {
        load_live_metric(self.executor.connection(), schema_id, ident)?
            .ok_or_else(|| StoreError::not_found(METRIC, ident.to_string()))
    }

    fn require_live_id(&self, ident: &NameIdentifier) -> StoreResult<EntityId> {
        let ids = self.resolver.resolve(ident.namespace())?;
        live_metric_id(self.executor.connection(), ids.schema_id, ident.code())?
            .ok_or_else(|| StoreError::not_found(METRIC, ident.to_string()))
    }
}

impl<R: NamespaceResolver> MetricRepository for SqliteMetricRepository<'_, R> {
    fn insert(&self, candidate: &Metric, overwrite: bool) -> StoreResult<Metric> {
        self.insert_with_initial_version(candidate, overwrite, candidate.fields.clone())
    }

    fn insert_with_initial_version(
        &self,
        candidate: &Metric,
        overwrite: bool,
        fields: MetricVersionFields,
    ) -> StoreResult<Metric> {
        validate_code(EntityKind::Metric, &candidate.code)?;
        let ids = self.resolver.resolve(&candidate.namespace)?;
        let ident = candidate.name_identifier();

        let mut metric = candidate.clone();
        metric.fields = fields;
        let audit_json = metric.audit.to_json()?;

        self.executor.run_write(|tx| {
            let existing = load_live_metric(tx, ids.schema_id, &ident)?;
            match existing {
                Some(_) if !overwrite => {
                    return Err(StoreError::already_exists(METRIC, ident.to_string()));
                }
                Some((stored, row_version)) => {
                    let next_version = stored.last_version + 1;
                    metric.id = stored.id;
                    metric.current_version = next_version;
                    metric.last_version = next_version;
                    let updated = tx.execute(
                        "UPDATE metric_meta
                         SET metric_name = ?1,
                             metric_type = ?2,
                             data_type = ?3,
                             metric_comment = ?4,
                             audit_info = ?5,
                             current_version = ?6,
                             last_version = ?6,
                             row_version = row_version + 1
                         WHERE metric_id = ?7 AND row_version = ?8 AND deleted_at = 0;",
                        params![
                            metric.name,
                            metric.metric_type.as_str(),
                            metric.data_type,
                            metric.comment,
                            audit_json,
                            next_version,
                            metric.id,
                            row_version,
                        ],
                    )?;
                    if updated == 0 {
                        return Err(StoreError::conflict(METRIC, ident.to_string()));
                    }
                }
                None => {
                    metric.current_version = 1;
                    metric.last_version = 1;
                    tx.execute(
                        "INSERT INTO metric_meta (
                            metric_id,
                            metric_code,
                            metric_name,
                            metric_type,
                            data_type,
                            metric_comment,
                            metalake_id,
                            catalog_id,
                            schema_id,
                            current_version,
                            last_version,
                            audit_info
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, 1, ?10);",
                        params![
                            metric.id,
                            metric.code,
                            metric.name,
                            metric.metric_type.as_str(),
                            metric.data_type,
                            metric.comment,
                            ids.metalake_id,
                            ids.catalog_id,
                            ids.schema_id,
                            audit_json,
                        ],
                    )
                    .map_err(|err| translate_write_error(err, METRIC, &ident.to_string()))?;
                }
            }

            let version = MetricVersion::snapshot_of(&metric, metric.last_version);
            let parent_ids = encode_parent_ids(&version.fields.parent_metric_ids)?;
            insert_version_row(tx, &ids, &version, parent_ids.as_deref(), &audit_json)
                .map_err(|err| {
                    translate_write_error(err, METRIC_VERSION_RESOURCE, &ident.to_string())
                })?;
            Ok(())
        })?;

        info!(
            "event=metric_insert module=repo status=ok name={} version={}",
            ident, metric.last_version
        );
        Ok(metric)
    }

    fn get(&self, ident: &NameIdentifier) -> StoreResult<Metric> {
        let ids = self.resolver.resolve(ident.namespace())?;
        self.require_live(ids.schema_id, ident)
            .map(|(metric, _)| metric)
    }

    fn list_by_namespace(
        &self,
        namespace: &Namespace,
        query: ListQuery,
    ) -> StoreResult<Vec<Metric>> {
        let ids = self.resolver.resolve(namespace)?;
        self.executor.run_read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{METRIC_SELECT_SQL}
                 WHERE m.schema_id = ?1 AND m.deleted_at = 0
                 ORDER BY m.metric_id ASC
                 LIMIT ?2 OFFSET ?3;"
            ))?;
            let mut rows = stmt.query(params![
                ids.schema_id,
                query.sql_limit(),
                i64::from(query.offset)
            ])?;
            let mut metrics = Vec::new();
            while let Some(row) = rows.next()? {
                let (metric, _) = parse_metric_row(row, namespace)?;
                metrics.push(metric);
            }
            Ok(metrics)
        })
    }

    fn count_by_namespace(&self, namespace: &Namespace) -> StoreResult<u64> {
        let ids = self.resolver.resolve(namespace)?;
        self.executor.run_read(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM metric_meta WHERE schema_id = ?1 AND deleted_at = 0;",
                [ids.schema_id],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
    }

    fn update<F>(&self, ident: &NameIdentifier, mutate: F) -> StoreResult<Metric>
    where
        F: FnOnce(Metric) -> Metric,
    {
        let ids = self.resolver.resolve(ident.namespace())?;
        let (snapshot, row_version) = self.require_live(ids.schema_id, ident)?;

        let mut candidate = mutate(snapshot.clone());
        check_candidate_identity(&snapshot, &candidate)?;

        let triggering = snapshot.requires_new_version(&candidate);
        if triggering {
            candidate.current_version = snapshot.last_version + 1;
            candidate.last_version = snapshot.last_version + 1;
        } else {
            candidate.current_version = snapshot.current_version;
            candidate.last_version = snapshot.last_version;
        }
        let audit_json = candidate.audit.to_json()?;
        let renamed = candidate.name_identifier();

        self.executor.run_write(|tx| {
            let updated = tx
                .execute(
                    "UPDATE metric_meta
                     SET metric_code = ?1,
                         metric_name = ?2,
                         metric_type = ?3,
                         data_type = ?4,
                         metric_comment = ?5,
                         audit_info = ?6,
                         current_version = ?7,
                         last_version = ?8,
                         row_version = row_version + 1
                     WHERE metric_id = ?9 AND row_version = ?10 AND deleted_at = 0;",
                    params![
                        candidate.code,
                        candidate.name,
                        candidate.metric_type.as_str(),
                        candidate.data_type,
                        candidate.comment,
                        audit_json,
                        candidate.current_version,
                        candidate.last_version,
                        snapshot.id,
                        row_version,
                    ],
                )
                .map_err(|err| translate_write_error(err, METRIC, &renamed.to_string()))?;
            if updated == 0 {
                return Err(StoreError::conflict(METRIC, ident.to_string()));
            }

            if triggering {
                let version = MetricVersion::snapshot_of(&candidate, candidate.last_version);
                let parent_ids = encode_parent_ids(&version.fields.parent_metric_ids)?;
                insert_version_row(tx, &ids, &version, parent_ids.as_deref(), &audit_json)
                    .map_err(|err| {
                        if is_unique_violation(&err) {
                            StoreError::conflict(METRIC_VERSION_RESOURCE, ident.to_string())
                        } else {
                            StoreError::from(err)
                        }
                    })?;
            }
            Ok(())
        })
        .map_err(|err| {
            if matches!(err, StoreError::Conflict { .. }) {
                debug!(
                    "event=metric_update module=repo status=conflict name={}",
                    ident
                );
            }
            err
        })?;

        if triggering {
            info!(
                "event=metric_version_create module=repo status=ok name={} version={}",
                renamed, candidate.last_version
            );
        }
        Ok(candidate)
    }

    fn switch_current_version(&self, ident: &NameIdentifier, target: i32) -> StoreResult<Metric> {
        let ids = self.resolver.resolve(ident.namespace())?;
        let (snapshot, row_version) = self.require_live(ids.schema_id, ident)?;
        if target < 1 || target > snapshot.last_version {
            return Err(StoreError::Invalid(format!(
                "version {target} of {ident} is outside 1..={}",
                snapshot.last_version
            )));
        }

        self.executor.run_write(|tx| {
            if !live_version_exists(tx, snapshot.id, target)? {
                return Err(StoreError::not_found(
                    METRIC_VERSION_RESOURCE,
                    format!("{ident}@{target}"),
                ));
            }
            let updated = tx.execute(
                "UPDATE metric_meta
                 SET current_version = ?1,
                     row_version = row_version + 1
                 WHERE metric_id = ?2 AND row_version = ?3 AND deleted_at = 0;",
                params![target, snapshot.id, row_version],
            )?;
            if updated == 0 {
                return Err(StoreError::conflict(METRIC, ident.to_string()));
            }
            load_live_metric(tx, ids.schema_id, ident)?
                .map(|(metric, _)| metric)
                .ok_or_else(|| StoreError::not_found(METRIC, ident.to_string()))
        })
    }

    fn delete(&self, ident: &NameIdentifier) -> StoreResult<bool> {
        let ids = match self.resolver.resolve(ident.namespace()) {
            Ok(ids) => ids,
            Err(err @ StoreError::NotFound { .. }) => {
                warn!(
                    "event=metric_delete module=repo status=skipped name={} error={}",
                    ident, err
                );
                return Ok(false);
            }
            Err(err) => return Err(err),
        };
        let Some(metric_id) =
            live_metric_id(self.executor.connection(), ids.schema_id, ident.code())?
        else {
            return Ok(false);
        };

        let deleted_at = now_epoch_ms();
        let ops: Vec<WriteOp<'_>> = vec![
            Box::new(move |tx: &Connection| -> StoreResult<usize> {
                Ok(tx.execute(
                    "UPDATE metric_meta SET deleted_at = ?1
                     WHERE metric_id = ?2 AND deleted_at = 0;",
                    params![deleted_at, metric_id],
                )?)
            }),
            Box::new(move |tx: &Connection| -> StoreResult<usize> {
                Ok(tx.execute(
                    "UPDATE metric_version_meta SET deleted_at = ?1
                     WHERE metric_id = ?2 AND deleted_at = 0;",
                    params![deleted_at, metric_id],
                )?)
            }),
        ];
        let counts = self.executor.run_write_batch(ops)?;
        Ok(counts.iter().any(|count| *count > 0))
    }

    fn get_version(&self, ident: &NameIdentifier, version: i32) -> StoreResult<MetricVersion> {
        let metric_id = self.require_live_id(ident)?;
        self.executor.run_read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{VERSION_SELECT_SQL}
                 WHERE metric_id = ?1 AND version = ?2 AND deleted_at = 0;"
            ))?;
            let mut rows = stmt.query(params![metric_id, version])?;
            let Some(row) = rows.next()? else {
                return Err(StoreError::not_found(
                    METRIC_VERSION_RESOURCE,
                    format!("{ident}@{version}"),
                ));
            };
            parse_version_row(row)
        })
    }

    fn list_versions(&self, ident: &NameIdentifier) -> StoreResult<Vec<MetricVersion>> {
        let metric_id = self.require_live_id(ident)?;
        self.executor.run_read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{VERSION_SELECT_SQL}
                 WHERE metric_id = ?1 AND deleted_at = 0
                 ORDER BY version ASC;"
            ))?;
            let mut rows = stmt.query([metric_id])?;
            let mut versions = Vec::new();
            while let Some(row) = rows.next()? {
                versions.push(parse_version_row(row)?);
            }
            Ok(versions)
        })
    }

    fn delete_version(&self, ident: &NameIdentifier, version: i32) -> StoreResult<bool> {
        let metric_id = self.require_live_id(ident)?;
        let deleted_at = now_epoch_ms();
        self.executor.run_write(|tx| {
            let current: Option<i32> = tx
                .query_row(
                    "SELECT current_version FROM metric_meta
                     WHERE metric_id = ?1 AND deleted_at = 0;",
                    [metric_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(current) = current else {
                return Ok(false);
            };
            if current == version {
                return Err(StoreError::Invalid(format!(
                    "version {version} is the current version of {ident}"
                )));
            }
            let changed = tx.execute(
                "UPDATE metric_version_meta SET deleted_at = ?1
                 WHERE metric_id = ?2 AND version = ?3 AND deleted_at = 0;",
                params![deleted_at, metric_id, version],
            )?;
            Ok(changed > 0)
        })
    }

    fn metric_codes_by_ids(&self, ids: &[EntityId]) -> StoreResult<Vec<Option<String>>> {
        self.executor.run_read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT metric_code FROM metric_meta WHERE metric_id = ?1 AND deleted_at = 0;",
            )?;
            let mut codes = Vec::with_capacity(ids.len());
            for id in ids {
                codes.push(stmt.query_row([id], |row| row.get(0)).optional()?);
            }
            Ok(codes)
        })
    }
}

fn live_metric_id(
    conn: &Connection,
    schema_id: EntityId,
    code: &str,
) -> StoreResult<Option<EntityId>> {
    Ok(conn
        .query_row(
            "SELECT metric_id FROM metric_meta
             WHERE schema_id = ?1 AND metric_code = ?2 AND deleted_at = 0;",
            params![schema_id, code],
            |row| row.get(0),
        )
        .optional()?)
}

fn live_version_exists(conn: &Connection, metric_id: EntityId, version: i32) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM metric_version_meta
            WHERE metric_id = ?1 AND version = ?2 AND deleted_at = 0
        );",
        params![metric_id, version],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Loads a live metric and its `row_version`.
fn load_live_metric(
    conn: &Connection,
    schema_id: EntityId,
    ident: &NameIdentifier,
) -> StoreResult<Option<(Metric, i64)>> {
    let mut stmt = conn.prepare(&format!(
        "{METRIC_SELECT_SQL}
         WHERE m.schema_id = ?1 AND m.metric_code = ?2 AND m.deleted_at = 0;"
    ))?;
    let mut rows = stmt.query(params![schema_id, ident.code()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let parsed = parse_metric_row(row, ident.namespace())?;
    Ok(Some(parsed))
}

fn insert_version_row(
    conn: &Connection,
    ids: &ParentIds,
    version: &MetricVersion,
    parent_ids: Option<&str>,
    audit_json: &str,
) -> rusqlite::Result<usize> {
    let fields = &version.fields;
    let (ref_catalog, ref_schema, ref_table) = match &fields.source_table {
        Some(source) => (
            Some(source.catalog.as_str()),
            Some(source.schema.as_str()),
            Some(source.table.as_str()),
        ),
        None => (None, None, None),
    };

    conn.execute(
        "INSERT INTO metric_version_meta (
            metric_id,
            version,
            metalake_id,
            catalog_id,
            schema_id,
            metric_code,
            metric_name,
            metric_type,
            data_type,
            metric_comment,
            metric_unit,
            aggregation_logic,
            parent_metric_ids,
            calculation_formula,
            ref_catalog_name,
            ref_schema_name,
            ref_table_name,
            measure_columns,
            filter_columns,
            audit_info
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20);",
        params![
            version.metric_id,
            version.version,
            ids.metalake_id,
            ids.catalog_id,
            ids.schema_id,
            version.metric_code,
            version.metric_name,
            version.metric_type.as_str(),
            version.data_type,
            version.comment,
            fields.unit,
            fields.aggregation_logic,
            parent_ids,
            fields.calculation_formula,
            ref_catalog,
            ref_schema,
            ref_table,
            fields.measure_columns,
            fields.filter_columns,
            audit_json,
        ],
    )
}

/// Empty parent lists are stored as NULL.
fn encode_parent_ids(ids: &[EntityId]) -> StoreResult<Option<String>> {
    if ids.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(ids)
        .map(Some)
        .map_err(|err| StoreError::corrupt(format!("cannot encode parent_metric_ids: {err}")))
}

fn decode_parent_ids(raw: Option<String>) -> StoreResult<Vec<EntityId>> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|err| StoreError::corrupt(format!("invalid parent_metric_ids `{raw}`: {err}"))),
    }
}

fn parse_metric_type(raw: &str) -> StoreResult<MetricType> {
    MetricType::parse(raw).ok_or_else(|| StoreError::corrupt(format!("invalid metric_type `{raw}`")))
}

fn parse_source_table(
    catalog: Option<String>,
    schema: Option<String>,
    table: Option<String>,
) -> StoreResult<Option<SourceTableRef>> {
    match (catalog, schema, table) {
        (Some(catalog), Some(schema), Some(table)) => Ok(Some(SourceTableRef {
            catalog,
            schema,
            table,
        })),
        (None, None, None) => Ok(None),
        _ => Err(StoreError::corrupt(
            "source table reference is partially populated",
        )),
    }
}

/// Reads version fields starting at column `offset`.
fn parse_version_fields(row: &Row<'_>, offset: usize) -> StoreResult<MetricVersionFields> {
    Ok(MetricVersionFields {
        unit: row.get(offset)?,
        aggregation_logic: row.get(offset + 1)?,
        parent_metric_ids: decode_parent_ids(row.get(offset + 2)?)?,
        calculation_formula: row.get(offset + 3)?,
        source_table: parse_source_table(
            row.get(offset + 4)?,
            row.get(offset + 5)?,
            row.get(offset + 6)?,
        )?,
        measure_columns: row.get(offset + 7)?,
        filter_columns: row.get(offset + 8)?,
    })
}

fn parse_metric_row(row: &Row<'_>, namespace: &Namespace) -> StoreResult<(Metric, i64)> {
    let metric_type: String = row.get(3)?;
    let audit_json: String = row.get(8)?;
    let metric = Metric {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        metric_type: parse_metric_type(&metric_type)?,
        data_type: row.get(4)?,
        comment: row.get(5)?,
        namespace: namespace.clone(),
        current_version: row.get(6)?,
        last_version: row.get(7)?,
        fields: parse_version_fields(row, 10)?,
        audit: AuditInfo::from_json(&audit_json)?,
    };
    let row_version: i64 = row.get(9)?;
    Ok((metric, row_version))
}

fn parse_version_row(row: &Row<'_>) -> StoreResult<MetricVersion> {
    let metric_type: String = row.get(4)?;
    let audit_json: String = row.get(7)?;
    Ok(MetricVersion {
        metric_id: row.get(0)?,
        version: row.get(1)?,
        metric_name: row.get(2)?,
        metric_code: row.get(3)?,
        metric_type: parse_metric_type(&metric_type)?,
        data_type: row.get(5)?,
        comment: row.get(6)?,
        audit: AuditInfo::from_json(&audit_json)?,
        deleted_at: row.get(8)?,
        fields: parse_version_fields(row, 9)?,
    })
}
