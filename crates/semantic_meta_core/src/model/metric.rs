//! Versioned metric model.
//!
//! # Responsibility
//! - Describe a metric entity with its current/last version pointers.
//! - Describe immutable metric version rows.
//! - Decide whether an edit needs a new version.
//!
//! # Invariants
//! - `1 <= current_version <= last_version`.
//! - Version numbers are never reused; `last_version` only increases.
//! - Only the fields in `MetricVersionFields` are version-significant.

use super::audit::{AuditInfo, SYSTEM_PRINCIPAL};
use super::ident::{generate_entity_id, EntityId, EntityKind, Namespace};
use super::CatalogEntity;
use crate::db::now_epoch_ms;
use serde::{Deserialize, Serialize};

/// Metric classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    /// Directly aggregated from a source table measure.
    Atomic,
    /// Atomic metric narrowed by modifiers.
    Derived,
    /// Computed from other metrics via a formula.
    Composite,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Atomic => "ATOMIC",
            Self::Derived => "DERIVED",
            Self::Composite => "COMPOSITE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ATOMIC" => Some(Self::Atomic),
            "DERIVED" => Some(Self::Derived),
            "COMPOSITE" => Some(Self::Composite),
            _ => None,
        }
    }
}

/// Physical table a metric aggregates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTableRef {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

/// Version-significant metric fields.
///
/// A change to any of these on update creates a new version row; all other
/// metric fields are overwritten in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricVersionFields {
    pub unit: Option<String>,
    pub aggregation_logic: Option<String>,
    /// Ordered; order is significant for version comparison.
    pub parent_metric_ids: Vec<EntityId>,
    pub calculation_formula: Option<String>,
    pub source_table: Option<SourceTableRef>,
    pub measure_columns: Option<String>,
    pub filter_columns: Option<String>,
}

impl MetricVersionFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Metric entity with the fields of its current version attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub metric_type: MetricType,
    pub data_type: Option<String>,
    pub comment: Option<String>,
    pub namespace: Namespace,
    /// Version readers should treat as effective.
    pub current_version: i32,
    /// Highest version ever allocated.
    pub last_version: i32,
    pub fields: MetricVersionFields,
    pub audit: AuditInfo,
}

impl Metric {
    pub fn new(
        namespace: Namespace,
        code: impl Into<String>,
        name: impl Into<String>,
        metric_type: MetricType,
    ) -> Self {
        Self {
            id: generate_entity_id(),
            code: code.into(),
            name: name.into(),
            metric_type,
            data_type: None,
            comment: None,
            namespace,
            current_version: 1,
            last_version: 1,
            fields: MetricVersionFields::default(),
            audit: AuditInfo::created_by(SYSTEM_PRINCIPAL, now_epoch_ms()),
        }
    }

    /// Whether replacing `self` with `candidate` must allocate a new version.
    pub fn requires_new_version(&self, candidate: &Metric) -> bool {
        self.fields != candidate.fields
    }
}

impl CatalogEntity for Metric {
    const KIND: EntityKind = EntityKind::Metric;

    fn id(&self) -> EntityId {
        self.id
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }

    fn set_code(&mut self, code: String) {
        self.code = code;
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }
}

/// Immutable snapshot of a metric's version-significant state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricVersion {
    pub metric_id: EntityId,
    pub version: i32,
    pub metric_name: String,
    pub metric_code: String,
    pub metric_type: MetricType,
    pub data_type: Option<String>,
    pub comment: Option<String>,
    pub fields: MetricVersionFields,
    pub audit: AuditInfo,
    /// `0` while live, deletion epoch ms once tombstoned.
    pub deleted_at: i64,
}

impl MetricVersion {
    /// Builds version `version` from the metric's current state.
    pub fn snapshot_of(metric: &Metric, version: i32) -> Self {
        Self {
            metric_id: metric.id,
            version,
            metric_name: metric.name.clone(),
            metric_code: metric.code.clone(),
            metric_type: metric.metric_type,
            data_type: metric.data_type.clone(),
            comment: metric.comment.clone(),
            fields: metric.fields.clone(),
            audit: metric.audit.clone(),
            deleted_at: 0,
        }
    }
}
