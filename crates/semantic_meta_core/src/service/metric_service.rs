//! Metric use-case service.
//!
//! # Responsibility
//! - Stamp audit metadata on create and alter.
//! - Express metric edits as typed changes applied in one update.
//!
//! # Invariants
//! - Every alteration goes through `MetricRepository::update`, so the
//!   version-bump rule and optimistic concurrency always apply.

use crate::db::now_epoch_ms;
use crate::error::StoreResult;
use crate::model::audit::AuditInfo;
use crate::model::ident::{EntityId, NameIdentifier, Namespace};
use crate::model::metric::{Metric, MetricVersion, SourceTableRef};
use crate::repo::metric_repo::MetricRepository;
use crate::repo::ListQuery;

/// Edit applicable to a metric.
///
/// Changes to unit, aggregation logic, parents, formula, source table,
/// measure or filter columns allocate a new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricChange {
    /// Changes the metric code.
    Rename(String),
    UpdateName(String),
    UpdateComment(Option<String>),
    UpdateDataType(Option<String>),
    UpdateUnit(Option<String>),
    UpdateAggregationLogic(Option<String>),
    UpdateParentMetrics(Vec<EntityId>),
    UpdateCalculationFormula(Option<String>),
    UpdateSourceTable(Option<SourceTableRef>),
    UpdateMeasureColumns(Option<String>),
    UpdateFilterColumns(Option<String>),
}

impl MetricChange {
    fn apply(&self, metric: &mut Metric) {
        match self {
            Self::Rename(code) => metric.code = code.clone(),
            Self::UpdateName(name) => metric.name = name.clone(),
            Self::UpdateComment(comment) => metric.comment = comment.clone(),
            Self::UpdateDataType(data_type) => metric.data_type = data_type.clone(),
            Self::UpdateUnit(unit) => metric.fields.unit = unit.clone(),
            Self::UpdateAggregationLogic(logic) => {
                metric.fields.aggregation_logic = logic.clone()
            }
            Self::UpdateParentMetrics(parents) => {
                metric.fields.parent_metric_ids = parents.clone()
            }
            Self::UpdateCalculationFormula(formula) => {
                metric.fields.calculation_formula = formula.clone()
            }
            Self::UpdateSourceTable(source) => metric.fields.source_table = source.clone(),
            Self::UpdateMeasureColumns(columns) => {
                metric.fields.measure_columns = columns.clone()
            }
            Self::UpdateFilterColumns(columns) => metric.fields.filter_columns = columns.clone(),
        }
    }
}

/// Use-case service wrapper for metric operations.
pub struct MetricService<R: MetricRepository> {
    repo: R,
    principal: String,
}

impl<R: MetricRepository> MetricService<R> {
    pub fn new(repo: R, principal: impl Into<String>) -> Self {
        Self {
            repo,
            principal: principal.into(),
        }
    }

    /// Creates `metric` with version 1, or appends a version when
    /// `overwrite` replaces an existing metric.
    pub fn create_metric(&self, mut metric: Metric, overwrite: bool) -> StoreResult<Metric> {
        metric.audit = AuditInfo::created_by(self.principal.as_str(), now_epoch_ms());
        self.repo.insert(&metric, overwrite)
    }

    /// Applies `changes` in order as one optimistic update.
    pub fn alter_metric(
        &self,
        ident: &NameIdentifier,
        changes: &[MetricChange],
    ) -> StoreResult<Metric> {
        let principal = self.principal.as_str();
        self.repo.update(ident, |mut metric| {
            for change in changes {
                change.apply(&mut metric);
            }
            metric.audit.touch(principal, now_epoch_ms());
            metric
        })
    }

    pub fn get_metric(&self, ident: &NameIdentifier) -> StoreResult<Metric> {
        self.repo.get(ident)
    }

    pub fn list_metrics(
        &self,
        namespace: &Namespace,
        query: ListQuery,
    ) -> StoreResult<Vec<Metric>> {
        self.repo.list_by_namespace(namespace, query)
    }

    pub fn count_metrics(&self, namespace: &Namespace) -> StoreResult<u64> {
        self.repo.count_by_namespace(namespace)
    }

    pub fn switch_version(&self, ident: &NameIdentifier, version: i32) -> StoreResult<Metric> {
        self.repo.switch_current_version(ident, version)
    }

    pub fn delete_metric(&self, ident: &NameIdentifier) -> StoreResult<bool> {
        self.repo.delete(ident)
    }

    pub fn get_version(&self, ident: &NameIdentifier, version: i32) -> StoreResult<MetricVersion> {
        self.repo.get_version(ident, version)
    }

    pub fn list_versions(&self, ident: &NameIdentifier) -> StoreResult<Vec<MetricVersion>> {
        self.repo.list_versions(ident)
    }

    pub fn delete_version(&self, ident: &NameIdentifier, version: i32) -> StoreResult<bool> {
        self.repo.delete_version(ident, version)
    }

    /// Resolves parent metric ids to codes for display.
    pub fn parent_codes(&self, metric: &Metric) -> StoreResult<Vec<Option<String>>> {
        self.repo
            .metric_codes_by_ids(&metric.fields.parent_metric_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::MetricChange;
    use crate::model::ident::Namespace;
    use crate::model::metric::{Metric, MetricType};

    #[test]
    fn entity_changes_leave_version_fields_alone() {
        let ns = Namespace::new("lake", "dw", "sales").unwrap();
        let metric = Metric::new(ns, "REVENUE", "revenue", MetricType::Atomic);
        let mut edited = metric.clone();
        MetricChange::UpdateComment(Some("gross".to_string())).apply(&mut edited);
        MetricChange::Rename("GROSS_REVENUE".to_string()).apply(&mut edited);

        assert_eq!(edited.code, "GROSS_REVENUE");
        assert!(!metric.requires_new_version(&edited));

        MetricChange::UpdateParentMetrics(vec![7]).apply(&mut edited);
        assert!(metric.requires_new_version(&edited));
    }
}
