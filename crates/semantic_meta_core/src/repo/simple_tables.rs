//! Table mappings for unversioned entity kinds.
//!
//! Each simple entity kind owns one table with the same shape:
//! id, code, name, kind-specific data columns, namespace ids,
//! `audit_info`, `row_version` and `deleted_at`. Only the parts that differ
//! per kind live here; SQL is assembled in `simple_repo`.

use crate::error::{StoreError, StoreResult};
use crate::model::audit::AuditInfo;
use crate::model::ident::Namespace;
use crate::model::simple::{MetricModifier, Unit, ValueDomain, ValueDomainType, WordRoot};
use crate::model::CatalogEntity;
use rusqlite::types::Value;
use rusqlite::Row;

/// Storage mapping for one simple entity kind.
///
/// Rows handed to `from_row` are laid out as
/// `id, code, name, DATA_COLUMNS...`.
pub trait SimpleEntityTable: CatalogEntity {
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    const CODE_COLUMN: &'static str;
    const NAME_COLUMN: &'static str;
    /// Kind-specific columns, in the order `data_values` produces them.
    const DATA_COLUMNS: &'static [&'static str];

    fn data_values(&self) -> Vec<Value>;

    fn from_row(row: &Row<'_>, namespace: Namespace, audit: AuditInfo) -> StoreResult<Self>;
}

/// Index of the first data column in a mapped row.
const DATA_OFFSET: usize = 3;

fn opt_text(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::Text)
}

impl SimpleEntityTable for WordRoot {
    const TABLE: &'static str = "word_root_meta";
    const ID_COLUMN: &'static str = "root_id";
    const CODE_COLUMN: &'static str = "root_code";
    const NAME_COLUMN: &'static str = "root_name";
    const DATA_COLUMNS: &'static [&'static str] = &["english_name", "data_type", "root_comment"];

    fn data_values(&self) -> Vec<Value> {
        vec![
            opt_text(&self.english_name),
            opt_text(&self.data_type),
            opt_text(&self.comment),
        ]
    }

    fn from_row(row: &Row<'_>, namespace: Namespace, audit: AuditInfo) -> StoreResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            english_name: row.get(DATA_OFFSET)?,
            data_type: row.get(DATA_OFFSET + 1)?,
            comment: row.get(DATA_OFFSET + 2)?,
            namespace,
            audit,
        })
    }
}

impl SimpleEntityTable for ValueDomain {
    const TABLE: &'static str = "value_domain_meta";
    const ID_COLUMN: &'static str = "domain_id";
    const CODE_COLUMN: &'static str = "domain_code";
    const NAME_COLUMN: &'static str = "domain_name";
    const DATA_COLUMNS: &'static [&'static str] = &[
        "domain_type",
        "domain_level",
        "items",
        "data_type",
        "domain_comment",
    ];

    fn data_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.domain_type.as_str().to_string()),
            opt_text(&self.domain_level),
            opt_text(&self.items),
            opt_text(&self.data_type),
            opt_text(&self.comment),
        ]
    }

    fn from_row(row: &Row<'_>, namespace: Namespace, audit: AuditInfo) -> StoreResult<Self> {
        let raw_type: String = row.get(DATA_OFFSET)?;
        let domain_type = ValueDomainType::parse(&raw_type)
            .ok_or_else(|| StoreError::corrupt(format!("invalid domain_type `{raw_type}`")))?;
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            domain_type,
            domain_level: row.get(DATA_OFFSET + 1)?,
            items: row.get(DATA_OFFSET + 2)?,
            data_type: row.get(DATA_OFFSET + 3)?,
            comment: row.get(DATA_OFFSET + 4)?,
            namespace,
            audit,
        })
    }
}

impl SimpleEntityTable for MetricModifier {
    const TABLE: &'static str = "metric_modifier_meta";
    const ID_COLUMN: &'static str = "modifier_id";
    const CODE_COLUMN: &'static str = "modifier_code";
    const NAME_COLUMN: &'static str = "modifier_name";
    const DATA_COLUMNS: &'static [&'static str] = &["modifier_type", "modifier_comment"];

    fn data_values(&self) -> Vec<Value> {
        vec![opt_text(&self.modifier_type), opt_text(&self.comment)]
    }

    fn from_row(row: &Row<'_>, namespace: Namespace, audit: AuditInfo) -> StoreResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            modifier_type: row.get(DATA_OFFSET)?,
            comment: row.get(DATA_OFFSET + 1)?,
            namespace,
            audit,
        })
    }
}

impl SimpleEntityTable for Unit {
    const TABLE: &'static str = "unit_meta";
    const ID_COLUMN: &'static str = "unit_id";
    const CODE_COLUMN: &'static str = "unit_code";
    const NAME_COLUMN: &'static str = "unit_name";
    const DATA_COLUMNS: &'static [&'static str] = &["unit_symbol", "unit_comment"];

    fn data_values(&self) -> Vec<Value> {
        vec![opt_text(&self.symbol), opt_text(&self.comment)]
    }

    fn from_row(row: &Row<'_>, namespace: Namespace, audit: AuditInfo) -> StoreResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            symbol: row.get(DATA_OFFSET)?,
            comment: row.get(DATA_OFFSET + 1)?,
            namespace,
            audit,
        })
    }
}
