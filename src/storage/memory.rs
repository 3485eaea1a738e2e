//! In-memory storage backend.
//!
//! Thread-safe implementation of [`EntityStore`], intended for embedded use,
//! the CLI, tests, and as a reference for real backends.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::entity::{ContactFields, EntityId, EntityKind, EntityRecord};
use crate::storage::traits::{EntityStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// One kind's records. `order` holds ids in insertion order; `by_id` owns
/// the records. Deletion removes from both.
#[derive(Debug, Default)]
struct KindState {
    order: Vec<EntityId>,
    by_id: HashMap<EntityId, EntityRecord>,
}

impl KindState {
    fn ordered(&self) -> Vec<EntityRecord> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    kinds: HashMap<EntityKind, KindState>,
}

/// Thread-safe in-memory record store.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    state: RwLock<StoreState>,
}

impl InMemoryEntityStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `records` in order.
    ///
    /// # Errors
    /// Returns `DuplicateKey` if two records of one kind share an id.
    pub fn with_records<I>(records: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = EntityRecord>,
    {
        let store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Number of stored records of a kind.
    pub fn count(&self, kind: EntityKind) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("entity.count"))?;
        Ok(state.kinds.get(&kind).map_or(0, |k| k.by_id.len()))
    }
}

impl EntityStore for InMemoryEntityStore {
    fn list(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("entity.list"))?;
        Ok(state.kinds.get(&kind).map(KindState::ordered).unwrap_or_default())
    }

    fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<EntityRecord>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("entity.get"))?;
        Ok(state.kinds.get(&kind).and_then(|k| k.by_id.get(id).cloned()))
    }

    fn insert(&self, record: EntityRecord) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("entity.insert"))?;
        let kind_state = state.kinds.entry(record.kind()).or_default();
        let id = record.id().clone();
        if kind_state.by_id.contains_key(&id) {
            return Err(StorageError::DuplicateKey(id));
        }

        kind_state.order.push(id.clone());
        kind_state.by_id.insert(id, record);
        Ok(())
    }

    fn update(&self, record: EntityRecord) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("entity.update"))?;
        let kind = record.kind();
        let id = record.id().clone();
        let slot = state
            .kinds
            .get_mut(&kind)
            .and_then(|k| k.by_id.get_mut(&id))
            .ok_or(StorageError::NotFound { kind, id })?;
        *slot = record;
        Ok(())
    }

    fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("entity.delete"))?;
        let not_found = || StorageError::NotFound {
            kind,
            id: id.clone(),
        };
        let kind_state = state.kinds.get_mut(&kind).ok_or_else(not_found)?;
        kind_state.by_id.remove(id).ok_or_else(not_found)?;
        kind_state.order.retain(|existing| existing != id);
        Ok(())
    }
}
