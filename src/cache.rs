//! Memoized data retrieval
//!
//! Loading a frame set from disk is far slower than rendering a chart from
//! it, so handlers go through a bounded LRU memo keyed on the request
//! parameters. Entries never expire unless a TTL is configured.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of memoized entries per cache
    pub max_entries: usize,
    /// Entry lifetime in seconds; `None` keeps entries until evicted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<i64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_entries: 128,
            ttl_seconds: None,
        }
    }
}

struct Entry<V> {
    value: Arc<V>,
    inserted: DateTime<Utc>,
    last_used: u64,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    tick: u64,
}

/// Thread-safe LRU memo with optional TTL
pub struct Memo<K, V> {
    inner: Mutex<Inner<K, V>>,
    max_entries: usize,
    ttl: Option<Duration>,
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    /// Create a new memo
    pub fn new(config: &CacheConfig) -> Self {
        Memo {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                tick: 0,
            }),
            max_entries: config.max_entries.max(1),
            ttl: config.ttl_seconds.map(Duration::seconds),
        }
    }

    fn is_fresh(&self, entry: &Entry<V>, now: DateTime<Utc>) -> bool {
        self.ttl.map_or(true, |ttl| now - entry.inserted < ttl)
    }

    /// Get a memoized value (returns None if stale or missing)
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.tick += 1;
        let tick = inner.tick;
        let now = Utc::now();

        let fresh = inner.entries.get(key).map(|e| self.is_fresh(e, now))?;
        if !fresh {
            inner.entries.remove(key);
            return None;
        }

        inner.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            Arc::clone(&entry.value)
        })
    }

    /// Store a value, evicting the least recently used entry when full
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.tick += 1;
        let tick = inner.tick;

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting {:?} from memo", oldest);
                inner.entries.remove(&oldest);
            }
        }

        inner.entries.insert(
            key,
            Entry {
                value: Arc::clone(&value),
                inserted: Utc::now(),
                last_used: tick,
            },
        );
        value
    }

    /// Return the memoized value for `key`, computing it with `load` on a miss.
    ///
    /// Errors from `load` are returned and not memoized. The lock is not held
    /// while loading, so two concurrent misses may both load.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        debug!("Memo miss for {:?}", key);
        let value = load()?;
        Ok(self.insert(key, value))
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all memoized values
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn memo(max_entries: usize) -> Memo<String, u32> {
        Memo::new(&CacheConfig {
            max_entries,
            ttl_seconds: None,
        })
    }

    #[test]
    fn test_loads_once() {
        let cache = memo(4);
        let calls = Cell::new(0);
        let load = || {
            calls.set(calls.get() + 1);
            Ok::<_, String>(7)
        };

        assert_eq!(*cache.get_or_try_insert_with("a".to_string(), load).unwrap(), 7);
        assert_eq!(*cache.get_or_try_insert_with("a".to_string(), load).unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_errors_not_memoized() {
        let cache = memo(4);
        let err = cache.get_or_try_insert_with("a".to_string(), || Err::<u32, _>("boom"));
        assert!(err.is_err());
        assert!(cache.is_empty());

        let ok = cache.get_or_try_insert_with("a".to_string(), || Ok::<_, &str>(1));
        assert_eq!(*ok.unwrap(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = memo(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        // touch a so b becomes the eviction candidate
        assert!(cache.get(&"a".to_string()).is_some());
        cache.insert("c".to_string(), 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&"a".to_string()).is_some());
        assert!(cache.get(&"b".to_string()).is_none());
        assert!(cache.get(&"c".to_string()).is_some());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache: Memo<u8, u8> = Memo::new(&CacheConfig {
            max_entries: 8,
            ttl_seconds: Some(0),
        });
        cache.insert(1, 1);
        assert!(cache.get(&1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = memo(2);
        cache.insert("a".to_string(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
