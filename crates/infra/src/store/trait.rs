use std::sync::Arc;

use thiserror::Error;

use lodge_core::{DomainError, DomainResult, Entity};

/// Store operation error.
///
/// Duplicate-key and not-found conditions are programming-contract
/// violations given correct facade orchestration; when they do occur they
/// propagate as the corresponding domain error rather than being masked.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A mutator passed to [`Store::update`] failed; nothing was persisted.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateKey(msg) => DomainError::conflict(msg),
            StoreError::NotFound(_) => DomainError::NotFound,
            StoreError::Domain(e) => e,
        }
    }
}

/// Read predicate over records.
pub type Predicate<'a, R> = &'a dyn Fn(&R) -> bool;

/// Fallible in-place mutation of a record. An `Err` aborts the update with
/// nothing persisted.
pub type Mutator<'a, R> = &'a mut dyn FnMut(&mut R) -> DomainResult<()>;

/// Keyed storage for one entity kind.
///
/// No entity-specific knowledge; validation and authorization live above this
/// layer. Implementations must make `add`/`update`/`delete` against one id
/// atomic with respect to concurrent mutations of the same id, and keep
/// `get_all` in insertion order.
pub trait Store<R>: Send + Sync
where
    R: Entity + Clone + Send + Sync,
{
    /// Insert a new record. Fails with [`StoreError::DuplicateKey`] if the id
    /// is already present.
    fn add(&self, record: R) -> Result<R, StoreError>;

    /// Look up a record by id.
    fn get(&self, id: &R::Id) -> Result<Option<R>, StoreError>;

    /// All records, in insertion order.
    fn get_all(&self) -> Result<Vec<R>, StoreError>;

    /// First record matching `predicate`, in insertion order.
    fn find_one(&self, predicate: Predicate<'_, R>) -> Result<Option<R>, StoreError>;

    /// All records matching `predicate`, in insertion order.
    fn find_all(&self, predicate: Predicate<'_, R>) -> Result<Vec<R>, StoreError>;

    /// Apply `mutate` to the stored record and persist the result atomically.
    /// Fails with [`StoreError::NotFound`] if the id is absent; a mutator
    /// error leaves the stored record unchanged.
    fn update(&self, id: &R::Id, mutate: Mutator<'_, R>) -> Result<R, StoreError>;

    /// Remove a record. Fails with [`StoreError::NotFound`] if absent.
    fn delete(&self, id: &R::Id) -> Result<(), StoreError>;
}

impl<S, R> Store<R> for Arc<S>
where
    S: Store<R> + ?Sized,
    R: Entity + Clone + Send + Sync,
{
    fn add(&self, record: R) -> Result<R, StoreError> {
        (**self).add(record)
    }

    fn get(&self, id: &R::Id) -> Result<Option<R>, StoreError> {
        (**self).get(id)
    }

    fn get_all(&self) -> Result<Vec<R>, StoreError> {
        (**self).get_all()
    }

    fn find_one(&self, predicate: Predicate<'_, R>) -> Result<Option<R>, StoreError> {
        (**self).find_one(predicate)
    }

    fn find_all(&self, predicate: Predicate<'_, R>) -> Result<Vec<R>, StoreError> {
        (**self).find_all(predicate)
    }

    fn update(&self, id: &R::Id, mutate: Mutator<'_, R>) -> Result<R, StoreError> {
        (**self).update(id, mutate)
    }

    fn delete(&self, id: &R::Id) -> Result<(), StoreError> {
        (**self).delete(id)
    }
}
