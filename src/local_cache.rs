use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at < now
    }
}

/// Bounded map with per-entry expiry. When full, the entry inserted first is
/// evicted. Expired entries are dropped lazily when looked up.
#[derive(Debug, Clone)]
pub struct ExpiringCache<V> {
    entries: IndexMap<String, CacheEntry<V>>,
    max_size: usize,
    ttl: Duration,
}

impl<V: Clone> ExpiringCache<V> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: IndexMap::new(),
            max_size: max_size.max(1),
            ttl,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let ttl = self.ttl;
        self.set_with_ttl(key, value, ttl);
    }

    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.entries.shift_remove_index(0);
        }
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key, entry);
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        if self.evict_if_expired(key) {
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn has(&mut self, key: &str) -> bool {
        !self.evict_if_expired(key) && self.entries.contains_key(key)
    }

    pub fn delete(&mut self, key: &str) -> Option<V> {
        self.entries.shift_remove(key).map(|entry| entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops every expired entry, keeping the order of the rest.
    pub fn clean_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_if_expired(&mut self, key: &str) -> bool {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.entries.shift_remove(key);
                true
            }
            _ => false,
        }
    }
}
