//! Short-lived cache for admin listing responses.
//!
//! Entries are fresh while `now - stored_at < ttl`. Stale entries are
//! dropped on read. Keys are namespaced as `namespace:name`.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use super::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
}

impl<'a> CacheKey<'a> {
    pub const fn new(namespace: &'a str, name: &'a str) -> Self {
        Self { namespace, name }
    }

    fn render(&self) -> String {
        format!("{}:{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

pub struct ListingCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ListingCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn get(&self, key: &CacheKey<'_>) -> Option<V> {
        let key = key.render();
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(&key) {
            if now - entry.stored_at < self.ttl {
                return Some(entry.value.clone());
            }
        }

        // Only evict if nobody refreshed the entry in the meantime.
        self.entries
            .remove_if(&key, |_, entry| now - entry.stored_at >= self.ttl);
        None
    }

    pub fn set(&self, key: &CacheKey<'_>, value: V) {
        self.entries.insert(
            key.render(),
            CacheEntry {
                value,
                stored_at: self.clock.now(),
            },
        );
    }

    pub fn invalidate(&self, key: &CacheKey<'_>) -> bool {
        self.entries.remove(&key.render()).is_some()
    }
}
