//! TTL cache for memoizing per-user reports.
//!
//! One mutex-guarded map of key -> (value, inserted-at). Entries expire
//! after a fixed TTL and the oldest insertion is evicted when the map is
//! full. Stale reads within the TTL are acceptable to callers; the cache is
//! an optimization with no correctness dependency.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

const DEFAULT_MAX_SIZE: usize = 1000;
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache configuration and occupancy.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_secs: u64,
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Mutex-guarded TTL map. Shared via `Arc`, injected through app state.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    max_size: usize,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_size,
            ttl,
        }
    }

    /// 1000 entries, one hour TTL.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_TTL)
    }

    /// Fetch a live entry; expired entries are removed on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert, evicting the oldest insertion if the map is full.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut entries = self.entries.lock().expect("cache lock poisoned");

        if !entries.contains_key(&key) && entries.len() >= self.max_size {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.entries.lock().expect("cache lock poisoned").remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().expect("cache lock poisoned");
        CacheStats {
            size: entries.len(),
            max_size: self.max_size,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}
