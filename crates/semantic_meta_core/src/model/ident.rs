//! Identifiers, namespaces and code validation.
//!
//! # Invariants
//! - A `Namespace` always has exactly three non-blank levels without `.`.
//! - Codes are validated per entity kind before any write.

use crate::error::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Numeric primary key of an entity row.
pub type EntityId = i64;

/// Resource name used for version-level errors.
pub const METRIC_VERSION_RESOURCE: &str = "metric_version";

const MAX_CODE_CHARS: usize = 64;

static IDENTIFIER_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid code regex"));
static WORD_ROOT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*$").expect("valid word root regex"));

/// Generates a new positive entity id from random UUID bits.
pub fn generate_entity_id() -> EntityId {
    let (high, _) = Uuid::new_v4().as_u64_pair();
    ((high & i64::MAX as u64) as i64).max(1)
}

/// Kinds of entities the store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Metric,
    WordRoot,
    ValueDomain,
    Modifier,
    Unit,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Metric,
        EntityKind::WordRoot,
        EntityKind::ValueDomain,
        EntityKind::Modifier,
        EntityKind::Unit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::WordRoot => "word_root",
            Self::ValueDomain => "value_domain",
            Self::Modifier => "metric_modifier",
            Self::Unit => "unit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "metric" => Some(Self::Metric),
            "word_root" => Some(Self::WordRoot),
            "value_domain" => Some(Self::ValueDomain),
            "metric_modifier" | "modifier" => Some(Self::Modifier),
            "unit" => Some(Self::Unit),
            _ => None,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks `code` is well-formed for `kind`.
///
/// Word roots are lowercase alphanumeric tokens; every other kind accepts
/// identifier-style codes (`[A-Za-z][A-Za-z0-9_]*`).
pub fn validate_code(kind: EntityKind, code: &str) -> StoreResult<()> {
    if code.is_empty() {
        return Err(StoreError::Invalid(format!("{kind} code must not be empty")));
    }
    if code.chars().count() > MAX_CODE_CHARS {
        return Err(StoreError::Invalid(format!(
            "{kind} code `{code}` exceeds {MAX_CODE_CHARS} characters"
        )));
    }
    let pattern = match kind {
        EntityKind::WordRoot => &*WORD_ROOT_CODE_RE,
        EntityKind::Metric
        | EntityKind::ValueDomain
        | EntityKind::Modifier
        | EntityKind::Unit => &*IDENTIFIER_CODE_RE,
    };
    if !pattern.is_match(code) {
        return Err(StoreError::Invalid(format!(
            "{kind} code `{code}` is malformed"
        )));
    }
    Ok(())
}

/// Three-level name path: metalake, catalog, schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    levels: [String; 3],
}

impl Namespace {
    pub fn new(
        metalake: impl Into<String>,
        catalog: impl Into<String>,
        schema: impl Into<String>,
    ) -> StoreResult<Self> {
        let levels = [metalake.into(), catalog.into(), schema.into()];
        for level in &levels {
            if level.trim().is_empty() || level.trim() != level || level.contains('.') {
                return Err(StoreError::Invalid(format!(
                    "namespace level `{level}` must be non-blank, trimmed and contain no `.`"
                )));
            }
        }
        Ok(Self { levels })
    }

    /// Parses a dotted `metalake.catalog.schema` path.
    pub fn parse(path: &str) -> StoreResult<Self> {
        let parts: Vec<&str> = path.split('.').collect();
        match parts.as_slice() {
            [metalake, catalog, schema] => Self::new(*metalake, *catalog, *schema),
            _ => Err(StoreError::Invalid(format!(
                "namespace `{path}` must have exactly three levels"
            ))),
        }
    }

    pub fn metalake(&self) -> &str {
        &self.levels[0]
    }

    pub fn catalog(&self) -> &str {
        &self.levels[1]
    }

    pub fn schema(&self) -> &str {
        &self.levels[2]
    }

    pub fn levels(&self) -> &[String; 3] {
        &self.levels
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.levels.join("."))
    }
}

/// Namespace plus the entity code; the external lookup key of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameIdentifier {
    namespace: Namespace,
    code: String,
}

impl NameIdentifier {
    pub fn new(namespace: Namespace, code: impl Into<String>) -> Self {
        Self {
            namespace,
            code: code.into(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl Display for NameIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.code)
    }
}

/// Resolved numeric ids of a namespace chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentIds {
    pub metalake_id: EntityId,
    pub catalog_id: EntityId,
    pub schema_id: EntityId,
}

#[cfg(test)]
mod tests {
    use super::{generate_entity_id, validate_code, EntityKind, NameIdentifier, Namespace};

    #[test]
    fn generated_ids_are_positive_and_distinct() {
        let first = generate_entity_id();
        let second = generate_entity_id();
        assert!(first > 0);
        assert!(second > 0);
        assert_ne!(first, second);
    }

    #[test]
    fn metric_codes_accept_identifier_style() {
        validate_code(EntityKind::Metric, "REVENUE").unwrap();
        validate_code(EntityKind::Metric, "order_amount_7d").unwrap();
        assert!(validate_code(EntityKind::Metric, "7d_amount").is_err());
        assert!(validate_code(EntityKind::Metric, "gross margin").is_err());
        assert!(validate_code(EntityKind::Metric, "").is_err());
    }

    #[test]
    fn word_root_codes_must_be_lowercase_tokens() {
        validate_code(EntityKind::WordRoot, "amt").unwrap();
        assert!(validate_code(EntityKind::WordRoot, "Amt").is_err());
        assert!(validate_code(EntityKind::WordRoot, "order_amt").is_err());
    }

    #[test]
    fn overlong_code_is_rejected() {
        let code = "A".repeat(65);
        assert!(validate_code(EntityKind::ValueDomain, &code).is_err());
    }

    #[test]
    fn namespace_rejects_blank_and_dotted_levels() {
        assert!(Namespace::new("lake", "", "sales").is_err());
        assert!(Namespace::new("lake", "dw.prod", "sales").is_err());
        assert!(Namespace::new(" lake", "dw", "sales").is_err());
    }

    #[test]
    fn namespace_parse_and_display_agree() {
        let ns = Namespace::parse("lake.dw.sales").unwrap();
        assert_eq!(ns.metalake(), "lake");
        assert_eq!(ns.schema(), "sales");
        assert_eq!(ns.to_string(), "lake.dw.sales");
        assert!(Namespace::parse("lake.dw").is_err());

        let ident = NameIdentifier::new(ns, "REVENUE");
        assert_eq!(ident.to_string(), "lake.dw.sales.REVENUE");
    }

    #[test]
    fn entity_kind_parse_accepts_cli_spellings() {
        assert_eq!(EntityKind::parse("word-root"), Some(EntityKind::WordRoot));
        assert_eq!(EntityKind::parse("modifier"), Some(EntityKind::Modifier));
        assert_eq!(EntityKind::parse("UNIT"), Some(EntityKind::Unit));
        assert_eq!(EntityKind::parse("bogus"), None);
    }
}
