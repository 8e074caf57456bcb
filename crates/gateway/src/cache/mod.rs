//! TTL response cache.
//!
//! Entries expire lazily: `get` checks age at read time and evicts what it
//! finds stale. When full, `set` evicts the entry with the oldest insertion
//! time (not least recently used). Finding it is a linear scan over all
//! entries, which is O(n) per eviction; fine for the few thousand entries
//! this cache is sized for.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;
use tokio::time::Instant;

use crate::models::OperationKind;

/// Build a cache key from an operation and its arguments.
///
/// Arguments are serialized to JSON; struct fields keep declaration order, so
/// equal arguments give equal keys.
pub fn cache_key<T: Serialize + ?Sized>(
    operation: OperationKind,
    args: &T,
) -> Result<String, serde_json::Error> {
    let args = serde_json::to_string(args)?;
    Ok(format!("{}:{}", operation.as_str(), args))
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// Breaks ties between entries inserted at the same instant.
    sequence: u64,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) > self.ttl
    }
}

#[derive(Debug)]
struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    next_sequence: u64,
}

/// Thread-safe TTL cache with a maximum entry count.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: RwLock<CacheInner<V>>,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    /// `max_entries` of 0 disables storage.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                next_sequence: 0,
            }),
            max_entries,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheInner<V>> {
        self.inner.read().unwrap_or_else(|poisoned| {
            warn!("Cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner<V>> {
        self.inner.write().unwrap_or_else(|poisoned| {
            warn!("Cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fresh value for `key`, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let inner = self.read();
            match inner.entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: another writer may have refreshed
        // or already removed the entry.
        let mut inner = self.write();
        if inner
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now))
        {
            inner.entries.remove(key);
            debug!("Cache: evicted expired entry {}", key);
        }
        None
    }

    /// Insert or replace `key`.
    ///
    /// Inserting a new key into a full cache first evicts the oldest entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if self.max_entries == 0 {
            return;
        }
        let key = key.into();
        let mut inner = self.write();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.inserted_at, entry.sequence))
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                inner.entries.remove(&oldest);
                debug!("Cache: full, evicted oldest entry {}", oldest);
            }
        }

        let sequence = inner.next_sequence;
        inner.next_sequence = inner.next_sequence.wrapping_add(1);
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                sequence,
                ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.write().entries.remove(key).map(|entry| entry.value)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.write();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now));
        before - inner.entries.len()
    }

    pub fn clear(&self) {
        self.write().entries.clear();
    }

    /// Stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
