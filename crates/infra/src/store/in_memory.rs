use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lodge_core::Entity;

use super::r#trait::{Mutator, Predicate, Store, StoreError};

struct Inner<R: Entity> {
    records: HashMap<R::Id, R>,
    /// Insertion-order index over `records`.
    order: Vec<R::Id>,
}

/// In-memory keyed store.
///
/// Intended for tests/dev and as the reference backend; a durable store
/// satisfies the same contract. A single lock serializes mutations, which
/// covers the per-id atomicity requirement. Mutators run against a copy of
/// the record, so a failing mutator cannot leave a half-written record
/// behind; for the same reason a poisoned lock is safe to recover.
pub struct InMemoryStore<R: Entity> {
    inner: RwLock<Inner<R>>,
}

impl<R: Entity> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }
}

impl<R: Entity> InMemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R> Store<R> for InMemoryStore<R>
where
    R: Entity + Clone + Send + Sync,
{
    fn add(&self, record: R) -> Result<R, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = *record.id();
        if inner.records.contains_key(&id) {
            return Err(StoreError::DuplicateKey(format!("{id:?}")));
        }
        inner.records.insert(id, record.clone());
        inner.order.push(id);
        Ok(record)
    }

    fn get(&self, id: &R::Id) -> Result<Option<R>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.records.get(id).cloned())
    }

    fn get_all(&self) -> Result<Vec<R>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect())
    }

    fn find_one(&self, predicate: Predicate<'_, R>) -> Result<Option<R>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .find(|r| predicate(r))
            .cloned())
    }

    fn find_all(&self, predicate: Predicate<'_, R>) -> Result<Vec<R>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    fn update(&self, id: &R::Id, mutate: Mutator<'_, R>) -> Result<R, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let current = inner
            .records
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("{id:?}")))?;

        let mut candidate = current.clone();
        mutate(&mut candidate)?;
        // Record ids are immutable; a mutator changing one is a bug upstream.
        debug_assert_eq!(candidate.id(), id);

        inner.records.insert(*id, candidate.clone());
        Ok(candidate)
    }

    fn delete(&self, id: &R::Id) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.records.remove(id).is_none() {
            return Err(StoreError::NotFound(format!("{id:?}")));
        }
        inner.order.retain(|existing| existing != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use lodge_core::{AmenityId, DomainError};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tag {
        id: AmenityId,
        label: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl Tag {
        fn new(label: &str) -> Self {
            let now = Utc::now();
            Self {
                id: AmenityId::new(),
                label: label.to_string(),
                created_at: now,
                updated_at: now,
            }
        }
    }

    impl Entity for Tag {
        type Id = AmenityId;

        fn id(&self) -> &Self::Id {
            &self.id
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn updated_at(&self) -> DateTime<Utc> {
            self.updated_at
        }
    }

    #[test]
    fn add_then_get_roundtrips() {
        let store = InMemoryStore::new();
        let tag = store.add(Tag::new("wifi")).unwrap();
        assert_eq!(store.get(&tag.id).unwrap(), Some(tag));
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        let tag = store.add(Tag::new("wifi")).unwrap();
        let err = store.add(tag).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[test]
    fn get_all_preserves_insertion_order() {
        let store = InMemoryStore::new();
        let a = store.add(Tag::new("a")).unwrap();
        let b = store.add(Tag::new("b")).unwrap();
        let c = store.add(Tag::new("c")).unwrap();
        let labels: Vec<_> = store.get_all().unwrap().into_iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);

        store.delete(&b.id).unwrap();
        let d = store.add(Tag::new("d")).unwrap();
        let ids: Vec<_> = store.get_all().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a.id, c.id, d.id]);
    }

    #[test]
    fn find_one_returns_first_match_in_order() {
        let store = InMemoryStore::new();
        store.add(Tag::new("x")).unwrap();
        let first = store.add(Tag::new("dup")).unwrap();
        store.add(Tag::new("dup")).unwrap();
        let found = store.find_one(&|t: &Tag| t.label == "dup").unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn update_applies_mutator() {
        let store = InMemoryStore::new();
        let tag = store.add(Tag::new("wifi")).unwrap();
        let updated = store
            .update(&tag.id, &mut |t| {
                t.label = "fast wifi".to_string();
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.label, "fast wifi");
        assert_eq!(store.get(&tag.id).unwrap().unwrap().label, "fast wifi");
    }

    #[test]
    fn failing_mutator_leaves_record_unchanged() {
        let store = InMemoryStore::new();
        let tag = store.add(Tag::new("wifi")).unwrap();
        let err = store
            .update(&tag.id, &mut |t| {
                t.label = "half-written".to_string();
                Err(DomainError::validation("nope"))
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(_)));
        assert_eq!(store.get(&tag.id).unwrap().unwrap().label, "wifi");
    }

    #[test]
    fn update_missing_id_fails() {
        let store: InMemoryStore<Tag> = InMemoryStore::new();
        let err = store
            .update(&AmenityId::new(), &mut |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn delete_missing_id_fails() {
        let store: InMemoryStore<Tag> = InMemoryStore::new();
        assert!(matches!(
            store.delete(&AmenityId::new()).unwrap_err(),
            StoreError::NotFound(_)
        ));
    }
}
