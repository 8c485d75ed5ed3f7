//! Domain model for catalog semantic metadata.
//!
//! # Responsibility
//! - Define word roots, value domains, modifiers, metrics and metric
//!   versions as plain data.
//! - Define namespace/identifier types and per-kind code validation.
//!
//! # Invariants
//! - Every entity is identified by a stable positive `EntityId`.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod audit;
pub mod ident;
pub mod metric;
pub mod simple;

use audit::AuditInfo;
use ident::{EntityId, EntityKind, NameIdentifier, Namespace};

/// Behavior shared by every named entity stored under a schema.
pub trait CatalogEntity: Clone {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;
    fn code(&self) -> &str;
    fn name(&self) -> &str;
    fn namespace(&self) -> &Namespace;
    fn audit(&self) -> &AuditInfo;
    fn audit_mut(&mut self) -> &mut AuditInfo;
    fn set_code(&mut self, code: String);
    fn set_name(&mut self, name: String);
    fn set_comment(&mut self, comment: Option<String>);

    fn name_identifier(&self) -> NameIdentifier {
        NameIdentifier::new(self.namespace().clone(), self.code())
    }
}
