use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Value;

use crate::errors::Result;

use super::{CollectionKey, CollectionStore};

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<CollectionKey, Value>,
    writes: Vec<CollectionKey>,
}

/// In-process store that records every write.
///
/// Clones share the same contents, so a host can keep a handle after boxing
/// one into a manager.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of writes performed.
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Collections written, in order.
    pub fn write_log(&self) -> Vec<CollectionKey> {
        self.lock().writes.clone()
    }

    /// Stored document, bypassing the trait.
    pub fn get(&self, key: CollectionKey) -> Option<Value> {
        self.lock().collections.get(&key).cloned()
    }

    /// Seeds a collection without counting it as a write.
    pub fn insert(&self, key: CollectionKey, value: Value) {
        self.lock().collections.insert(key, value);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a panic elsewhere; the data is still usable.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CollectionStore for MemoryStorage {
    fn read(&self, key: CollectionKey) -> Result<Option<Value>> {
        Ok(self.get(key))
    }

    fn write(&self, key: CollectionKey, value: &Value) -> Result<()> {
        let mut inner = self.lock();
        inner.collections.insert(key, value.clone());
        inner.writes.push(key);
        Ok(())
    }
}
