// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local definition cache
//!
//! Definitions are read on every guarded mutation and change rarely. Entries
//! live for a fixed TTL; writes through this cache invalidate the local
//! entry, while writes from other processes become visible once the TTL
//! expires.

use stately_core::{Clock, MachineKey, StateMachineDefinition};
use stately_storage::{Store, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Cached {
    /// `None` records that no definition exists
    definition: Option<StateMachineDefinition>,
    loaded_at: Instant,
}

pub struct DefinitionCache<S: Store, C: Clock> {
    store: S,
    clock: C,
    ttl: Duration,
    entries: Arc<RwLock<HashMap<MachineKey, Cached>>>,
}

impl<S: Store, C: Clock> Clone for DefinitionCache<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
            ttl: self.ttl,
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<S: Store, C: Clock> DefinitionCache<S, C> {
    pub fn new(store: S, clock: C, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached definition, loading from the store when missing or expired
    pub fn get(&self, key: &MachineKey) -> Result<Option<StateMachineDefinition>, StoreError> {
        self.get_with(key, |key| self.store.definition(key))
    }

    /// Like [`get`](Self::get) but loads through `load` on a miss
    ///
    /// Used inside a store transaction, where going back to the store would
    /// nest transactions.
    pub fn get_with(
        &self,
        key: &MachineKey,
        load: impl FnOnce(&MachineKey) -> Result<Option<StateMachineDefinition>, StoreError>,
    ) -> Result<Option<StateMachineDefinition>, StoreError> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(cached) = entries.get(key) {
                if now.saturating_duration_since(cached.loaded_at) < self.ttl {
                    return Ok(cached.definition.clone());
                }
            }
        }

        let definition = load(key)?;
        tracing::trace!(%key, found = definition.is_some(), "loaded definition");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.clone(),
            Cached {
                definition: definition.clone(),
                loaded_at: now,
            },
        );
        Ok(definition)
    }

    /// Validate and store a definition, replacing any with the same key
    pub fn put(&self, definition: StateMachineDefinition) -> Result<(), StoreError> {
        let key = definition.key();
        self.store.put_definition(definition)?;
        self.invalidate(&key);
        tracing::info!(%key, "definition stored");
        Ok(())
    }

    pub fn delete(&self, key: &MachineKey) -> Result<bool, StoreError> {
        let deleted = self.store.delete_definition(key)?;
        self.invalidate(key);
        if deleted {
            tracing::info!(%key, "definition deleted");
        }
        Ok(deleted)
    }

    pub fn invalidate(&self, key: &MachineKey) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
