use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A cached value and the moment it was loaded
struct Entry<V> {
    loaded_at: Instant,
    value: Arc<V>,
}

/// Read-through cache with a fixed time-to-live per entry.
///
/// The lock is released while the loader runs, so two callers racing on an
/// expired key may both load; the later insert wins.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash + Copy, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached value for `key`, if any
    pub fn get(&self, key: K) -> Option<Arc<V>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&key)
            .filter(|e| e.loaded_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.value))
    }

    /// Cached value for `key`, running `load` on a miss or after expiry.
    /// Loader errors are returned as-is and nothing is cached.
    pub fn get_or_try_load<E>(&self, key: K, load: impl FnOnce() -> Result<V, E>) -> Result<Arc<V>, E> {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let value = Arc::new(load()?);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            Entry {
                loaded_at: Instant::now(),
                value: Arc::clone(&value),
            },
        );
        Ok(value)
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_hit_within_ttl() {
        let cache: TtlCache<u8, String> = TtlCache::new(Duration::from_secs(3600));
        let loads = Cell::new(0);
        for _ in 0..3 {
            let v = cache
                .get_or_try_load(1, || {
                    loads.set(loads.get() + 1);
                    Ok::<_, ()>("gdp".to_string())
                })
                .unwrap();
            assert_eq!(v.as_str(), "gdp");
        }
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_expired_entry_reloads() {
        let cache: TtlCache<u8, u32> = TtlCache::new(Duration::ZERO);
        let loads = Cell::new(0);
        for _ in 0..3 {
            cache
                .get_or_try_load(7, || {
                    loads.set(loads.get() + 1);
                    Ok::<_, ()>(loads.get())
                })
                .unwrap();
        }
        assert_eq!(loads.get(), 3);
        assert!(cache.get(7).is_none());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: TtlCache<u8, u32> = TtlCache::new(Duration::from_secs(60));
        assert!(cache.get_or_try_load(2, || Err("missing file")).is_err());
        assert!(cache.get(2).is_none());
        assert_eq!(*cache.get_or_try_load(2, || Ok::<_, &str>(5)).unwrap(), 5);
        cache.clear();
        assert!(cache.get(2).is_none());
    }
}
