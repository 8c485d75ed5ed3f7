//! Unversioned schema-scoped entities: word roots, value domains, metric
//! modifiers and units.
//!
//! # Invariants
//! - One physical row per logical entity; updates overwrite in place.
//! - `code` is unique among live siblings of one schema.

use super::audit::{AuditInfo, SYSTEM_PRINCIPAL};
use super::ident::{generate_entity_id, EntityId, EntityKind, Namespace};
use super::CatalogEntity;
use crate::db::now_epoch_ms;
use serde::{Deserialize, Serialize};

/// Naming token used to compose standardized column and metric names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRoot {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub english_name: Option<String>,
    pub data_type: Option<String>,
    pub comment: Option<String>,
    pub namespace: Namespace,
    pub audit: AuditInfo,
}

impl WordRoot {
    pub fn new(namespace: Namespace, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: generate_entity_id(),
            code: code.into(),
            name: name.into(),
            english_name: None,
            data_type: None,
            comment: None,
            namespace,
            audit: AuditInfo::created_by(SYSTEM_PRINCIPAL, now_epoch_ms()),
        }
    }
}

/// How a value domain constrains its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueDomainType {
    Enum,
    Range,
    Regex,
}

impl ValueDomainType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enum => "ENUM",
            Self::Range => "RANGE",
            Self::Regex => "REGEX",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ENUM" => Some(Self::Enum),
            "RANGE" => Some(Self::Range),
            "REGEX" => Some(Self::Regex),
            _ => None,
        }
    }
}

/// Allowed-value definition shared by columns and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDomain {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub domain_type: ValueDomainType,
    pub domain_level: Option<String>,
    /// Serialized enum items, range bounds or pattern, depending on type.
    pub items: Option<String>,
    pub data_type: Option<String>,
    pub comment: Option<String>,
    pub namespace: Namespace,
    pub audit: AuditInfo,
}

impl ValueDomain {
    pub fn new(
        namespace: Namespace,
        code: impl Into<String>,
        name: impl Into<String>,
        domain_type: ValueDomainType,
    ) -> Self {
        Self {
            id: generate_entity_id(),
            code: code.into(),
            name: name.into(),
            domain_type,
            domain_level: None,
            items: None,
            data_type: None,
            comment: None,
            namespace,
            audit: AuditInfo::created_by(SYSTEM_PRINCIPAL, now_epoch_ms()),
        }
    }
}

/// Qualifier (time period, dimension filter) applied to a metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricModifier {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub modifier_type: Option<String>,
    pub comment: Option<String>,
    pub namespace: Namespace,
    pub audit: AuditInfo,
}

impl MetricModifier {
    pub fn new(namespace: Namespace, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: generate_entity_id(),
            code: code.into(),
            name: name.into(),
            modifier_type: None,
            comment: None,
            namespace,
            audit: AuditInfo::created_by(SYSTEM_PRINCIPAL, now_epoch_ms()),
        }
    }
}

/// Measurement unit referenced by metric versions (`metric_unit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    /// Display symbol, e.g. `$` or `%`.
    pub symbol: Option<String>,
    pub comment: Option<String>,
    pub namespace: Namespace,
    pub audit: AuditInfo,
}

impl Unit {
    pub fn new(namespace: Namespace, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: generate_entity_id(),
            code: code.into(),
            name: name.into(),
            symbol: None,
            comment: None,
            namespace,
            audit: AuditInfo::created_by(SYSTEM_PRINCIPAL, now_epoch_ms()),
        }
    }
}

macro_rules! impl_catalog_entity {
    ($entity:ty, $kind:expr) => {
        impl CatalogEntity for $entity {
            const KIND: EntityKind = $kind;

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
    };
}

impl_catalog_entity!(WordRoot, EntityKind::WordRoot);
impl_catalog_entity!(ValueDomain, EntityKind::ValueDomain);
impl_catalog_entity!(MetricModifier, EntityKind::Modifier);
impl_catalog_entity!(Unit, EntityKind::Unit);

#[cfg(test)]
mod tests {
    use super::{MetricModifier, ValueDomainType, WordRoot};
    use crate::model::audit::SYSTEM_PRINCIPAL;
    use crate::model::ident::Namespace;
    use crate::model::CatalogEntity;

    #[test]
    fn new_entities_get_fresh_ids_and_system_audit() {
        let ns = Namespace::new("lake", "dw", "sales").unwrap();
        let a = WordRoot::new(ns.clone(), "amt", "amount");
        let b = MetricModifier::new(ns, "last_7d", "last 7 days");

        assert_ne!(a.id, b.id);
        assert_eq!(a.audit.creator, SYSTEM_PRINCIPAL);
        assert!(a.audit.create_time_ms > 0);
        assert_eq!(a.name_identifier().to_string(), "lake.dw.sales.amt");
    }

    #[test]
    fn value_domain_type_round_trips_storage_text() {
        for kind in [
            ValueDomainType::Enum,
            ValueDomainType::Range,
            ValueDomainType::Regex,
        ] {
            assert_eq!(ValueDomainType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ValueDomainType::parse("enum"), None);
    }
}
