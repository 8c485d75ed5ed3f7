//! Versioned metadata entity store for catalog semantic metadata.
//! This crate is the single source of truth for store invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod namespace;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use db::{now_epoch_ms, open_db, open_db_in_memory, open_db_with_config, DbError};
pub use error::{StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::audit::AuditInfo;
pub use model::ident::{EntityId, EntityKind, NameIdentifier, Namespace, ParentIds};
pub use model::metric::{Metric, MetricType, MetricVersion, MetricVersionFields, SourceTableRef};
pub use model::simple::{MetricModifier, Unit, ValueDomain, ValueDomainType, WordRoot};
pub use model::CatalogEntity;
pub use namespace::{NamespaceResolver, SqliteNamespaceResolver};
pub use repo::metric_repo::{MetricRepository, SqliteMetricRepository};
pub use repo::simple_repo::{
    ModifierRepository, SimpleEntityRepository, SqliteSimpleEntityRepository, UnitRepository,
    ValueDomainRepository, WordRootRepository,
};
pub use repo::{ListQuery, MAX_LIST_LIMIT};
pub use service::metric_service::{MetricChange, MetricService};
pub use service::retention_service::{RetentionSweeper, SweepSummary};
pub use service::simple_service::{SimpleEntityChange, SimpleEntityService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
