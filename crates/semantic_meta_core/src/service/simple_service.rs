//! Use-case service for word roots, value domains and metric modifiers.

use crate::db::now_epoch_ms;
use crate::error::StoreResult;
use crate::model::audit::AuditInfo;
use crate::model::ident::{NameIdentifier, Namespace};
use crate::model::CatalogEntity;
use crate::repo::simple_repo::SimpleEntityRepository;
use crate::repo::ListQuery;
use std::marker::PhantomData;

/// Edit applicable to any simple entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleEntityChange {
    /// Changes the code, i.e. the last segment of the name identifier.
    Rename(String),
    UpdateName(String),
    UpdateComment(Option<String>),
}

impl SimpleEntityChange {
    fn apply<E: CatalogEntity>(&self, entity: &mut E) {
        match self {
            Self::Rename(code) => entity.set_code(code.clone()),
            Self::UpdateName(name) => entity.set_name(name.clone()),
            Self::UpdateComment(comment) => entity.set_comment(comment.clone()),
        }
    }
}

/// Service wrapper over one simple entity store.
pub struct SimpleEntityService<E, R> {
    repo: R,
    principal: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R> SimpleEntityService<E, R>
where
    E: CatalogEntity,
    R: SimpleEntityRepository<E>,
{
    pub fn new(repo: R, principal: impl Into<String>) -> Self {
        Self {
            repo,
            principal: principal.into(),
            _entity: PhantomData,
        }
    }

    /// Creates `entity` with the service principal as creator.
    pub fn create(&self, mut entity: E, overwrite: bool) -> StoreResult<E> {
        *entity.audit_mut() = AuditInfo::created_by(self.principal.as_str(), now_epoch_ms());
        self.repo.insert(&entity, overwrite)
    }

    /// Applies `changes` in order as one optimistic update.
    pub fn alter(&self, ident: &NameIdentifier, changes: &[SimpleEntityChange]) -> StoreResult<E> {
        self.alter_with(ident, |mut entity| {
            for change in changes {
                change.apply(&mut entity);
            }
            entity
        })
    }

    /// Applies an arbitrary edit as one optimistic update.
    pub fn alter_with<F>(&self, ident: &NameIdentifier, edit: F) -> StoreResult<E>
    where
        F: FnOnce(E) -> E,
    {
        let principal = self.principal.as_str();
        self.repo.update(ident, |entity| {
            let mut edited = edit(entity);
            edited.audit_mut().touch(principal, now_epoch_ms());
            edited
        })
    }

    pub fn get(&self, ident: &NameIdentifier) -> StoreResult<E> {
        self.repo.get(ident)
    }

    pub fn list(&self, namespace: &Namespace, query: ListQuery) -> StoreResult<Vec<E>> {
        self.repo.list_by_namespace(namespace, query)
    }

    pub fn count(&self, namespace: &Namespace) -> StoreResult<u64> {
        self.repo.count_by_namespace(namespace)
    }

    pub fn delete(&self, ident: &NameIdentifier) -> StoreResult<bool> {
        self.repo.soft_delete(ident)
    }
}
