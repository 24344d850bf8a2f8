//! Case-insensitive natural-key index over a persisted collection.
//!
//! Built once per import run from a `list_all`-style fetch and updated
//! incrementally as the reconciler creates entities, so later rows in the
//! same batch match entities created by earlier rows.

use std::collections::HashMap;

use crate::models::Named;

/// Request-scoped map from lowercased entity name to entity.
#[derive(Debug, Default)]
pub struct IdentityIndex<T> {
    entries: HashMap<String, T>,
}

impl<T: Named> IdentityIndex<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Builds the index from already-fetched entities.
    ///
    /// If two entities share a name modulo case, the later one wins. That
    /// mirrors the persisted state the lookup is approximating: the
    /// reconciler only ever needs one match per natural key.
    pub fn build<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut index = Self::new();
        for entity in entities {
            index.insert(entity);
        }
        index
    }

    /// Looks up an entity by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(&name.trim().to_lowercase())
    }

    /// Registers an entity under its lowercased natural key, replacing any
    /// previous entry for the same key.
    pub fn insert(&mut self, entity: T) {
        self.entries
            .insert(entity.natural_key().trim().to_lowercase(), entity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
