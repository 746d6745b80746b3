use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Minimal TTL cache seam. The default backing store is an in-process map;
/// the trait leaves room for a distributed store later without touching
/// the estimator.
pub trait Cache<V: Clone>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn set(&self, key: String, value: V, ttl: Duration);
}

struct Entry<V> {
    inserted_at: Instant,
    ttl: Duration,
    value: V,
}

/// Lazy TTL-on-read map. Stale entries are only detected when read and are
/// superseded by the next `set`; there is no background sweep. Values are
/// immutable once inserted, so a lost race on the same key costs at most
/// one redundant upstream fetch.
pub struct InMemoryTtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V> InMemoryTtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> Default for InMemoryTtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> Cache<V> for InMemoryTtlCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() < entry.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn set(&self, key: String, value: V, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                Entry {
                    inserted_at: Instant::now(),
                    ttl,
                    value,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_returned() {
        let cache = InMemoryTtlCache::new();
        cache.set("k".to_string(), 42, Duration::from_secs(30));
        assert_eq!(cache.get("k"), Some(42));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn stale_entry_is_treated_as_missing() {
        let cache = InMemoryTtlCache::new();
        cache.set("k".to_string(), 42, Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn set_supersedes_previous_value() {
        let cache = InMemoryTtlCache::new();
        cache.set("k".to_string(), 1, Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(25));
        cache.set("k".to_string(), 2, Duration::from_secs(30));
        assert_eq!(cache.get("k"), Some(2));
    }
}
