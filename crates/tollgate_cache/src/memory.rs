//! In-process cache backend.

use derive_getters::Getters;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tollgate_error::TollgateResult;
use tollgate_interface::Cache;

use crate::namespace::escape_component;

/// Configuration for [`MemoryCache`].
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct MemoryCacheConfig {
    /// Maximum entries across this cache and all its children
    #[serde(default = "default_max_entries")]
    max_entries: usize,
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    metadata: Option<Value>,
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<String, Entry>,
    access_order: VecDeque<String>,
}

impl Store {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        self.access_order.push_back(key.to_string());
    }

    fn forget(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self.access_order.pop_front() {
            tracing::debug!(key = %key, "Evicting least recently used entry");
            self.entries.remove(&key);
        }
    }
}

/// Cache held in process memory, evicting the least recently used entry
/// when full.
///
/// Children are views over the same storage with a `name/` key prefix, so
/// the entry limit applies to the whole tree. Names and keys are escaped
/// before joining, so no key of one cache can reach into another.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tollgate_cache::MemoryCache;
/// use tollgate_interface::Cache;
///
/// let cache = MemoryCache::default();
/// let chat = cache.child("gpt-4o");
///
/// chat.set("k", json!("v"), None).unwrap();
/// assert!(chat.has("k").unwrap());
/// assert!(!cache.has("k").unwrap());
///
/// cache.clear().unwrap();
/// assert!(!chat.has("k").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct MemoryCache {
    config: MemoryCacheConfig,
    prefix: String,
    store: Arc<Mutex<Store>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new(config: MemoryCacheConfig) -> Self {
        tracing::debug!(max_entries = config.max_entries, "Creating MemoryCache");
        Self {
            config,
            prefix: String::new(),
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    /// Entries stored under this cache and its children.
    pub fn len(&self) -> usize {
        let store = self.store.lock();
        store
            .entries
            .keys()
            .filter(|k| k.starts_with(&self.prefix))
            .count()
    }

    /// Whether this cache and its children hold no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Metadata stored alongside `key`.
    pub fn metadata(&self, key: &str) -> Option<Value> {
        let store = self.store.lock();
        store
            .entries
            .get(&self.full_key(key))
            .and_then(|entry| entry.metadata.clone())
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, escape_component(key))
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(MemoryCacheConfig::default())
    }
}

impl Cache for MemoryCache {
    fn has(&self, key: &str) -> TollgateResult<bool> {
        Ok(self.store.lock().entries.contains_key(&self.full_key(key)))
    }

    fn get(&self, key: &str) -> TollgateResult<Option<Value>> {
        let full_key = self.full_key(key);
        let mut store = self.store.lock();
        let value = store.entries.get(&full_key).map(|entry| entry.value.clone());
        if value.is_some() {
            store.touch(&full_key);
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: Value, metadata: Option<Value>) -> TollgateResult<()> {
        let full_key = self.full_key(key);
        let mut store = self.store.lock();
        if store.entries.len() >= self.config.max_entries && !store.entries.contains_key(&full_key)
        {
            store.evict_lru();
        }
        store.touch(&full_key);
        store.entries.insert(full_key, Entry { value, metadata });
        Ok(())
    }

    fn remove(&self, key: &str) -> TollgateResult<()> {
        self.store.lock().forget(&self.full_key(key));
        Ok(())
    }

    fn clear(&self) -> TollgateResult<()> {
        let mut store = self.store.lock();
        let doomed: Vec<String> = store
            .entries
            .keys()
            .filter(|k| k.starts_with(&self.prefix))
            .cloned()
            .collect();
        for key in &doomed {
            store.forget(key);
        }
        tracing::info!(cleared = doomed.len(), prefix = %self.prefix, "Cleared cache");
        Ok(())
    }

    fn child(&self, name: &str) -> Arc<dyn Cache> {
        Arc::new(Self {
            config: self.config.clone(),
            prefix: format!("{}{}/", self.prefix, escape_component(name)),
            store: Arc::clone(&self.store),
        })
    }
}
