// src/cache.rs
//! Keyed store of ready-to-use graphics objects.
//!
//! Not synchronized: only the GPU-owning thread writes to it. Entries are
//! handed out as `Arc<T>`, so a handle outlives `clear()` or an overwrite.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};

pub struct ResourceCache<T> {
    entries: HashMap<String, Arc<T>>,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResourceCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert `resource` under `key`, replacing (and warning about) any previous entry.
    pub fn store(&mut self, key: impl Into<String>, resource: Arc<T>) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            log::warn!("Overwritten a resource with key: {}", key);
        }
        self.entries.insert(key, resource);
    }

    /// Shared handle for `key`, or [`Error::ResourceUnavailable`] naming it.
    pub fn get(&self, key: &str) -> Result<Arc<T>> {
        self.try_get(key)
            .ok_or_else(|| Error::unavailable(key, "no resource is stored under this key"))
    }

    pub fn try_get(&self, key: &str) -> Option<Arc<T>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<T>> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the cache's share of every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
