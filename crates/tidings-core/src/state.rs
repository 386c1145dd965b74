//! Auxiliary state store shared alongside the event bus.
//!
//! `StateStore` is a flat concurrent key-value map backed by `DashMap`.
//! Values are cloned on read so no `DashMap` guard outlives a call.
//! Bulk operations are not atomic: `set_many` sets each key independently
//! and `clear` empties shard by shard, so concurrent writers may interleave.

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

/// Concurrent string-keyed store of JSON values.
#[derive(Debug, Default)]
pub struct StateStore {
    inner: DashMap<String, Value>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Get a cloned copy of the value at `key`, or `None` if absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    /// Insert or overwrite a key-value pair.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.insert(key.into(), value);
    }

    /// Set every pair from `entries`, each independently.
    pub fn set_many<I, K>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut count = 0usize;
        for (key, value) in entries {
            self.inner.insert(key.into(), value);
            count += 1;
        }
        debug!(count, "set states");
    }

    /// Remove a key and return its value, if present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.remove(key).map(|(_, v)| v)
    }

    /// Check whether a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Whether `key` is present and equal to `expected`.
    pub fn equals(&self, key: &str, expected: &Value) -> bool {
        self.inner.get(key).is_some_and(|r| r.value() == expected)
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let before = self.inner.len();
        self.inner.clear();
        debug!(cleared = before, "cleared states");
    }

    /// Snapshot of all current keys.
    pub fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }

    /// Number of entries in the store.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
