use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::computation::Computation;
use crate::key::CacheKey;

/// The mapping from cache keys to computations.
///
/// The store is supplied by the embedding application, which controls size
/// bounds, eviction and sharing. The engine only ever reads, inserts and
/// overwrites entries; it never removes them proactively. Evicting an entry
/// does not cancel its computation.
pub trait CacheStore<T>: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Computation<T>>;

    /// Installs `computation` at `key`, overwriting any previous entry.
    fn insert(&self, key: CacheKey, computation: Computation<T>);
}

impl<T, S: CacheStore<T>> CacheStore<T> for Arc<S> {
    fn get(&self, key: &CacheKey) -> Option<Computation<T>> {
        (**self).get(key)
    }

    fn insert(&self, key: CacheKey, computation: Computation<T>) {
        (**self).insert(key, computation)
    }
}

/// The default store: an unbounded in-memory mapping.
pub struct MemoryStore<T> {
    entries: Mutex<BTreeMap<CacheKey, Computation<T>>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// The number of resident entries, including completed ones.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> CacheStore<T> for MemoryStore<T> {
    fn get(&self, key: &CacheKey) -> Option<Computation<T>> {
        self.entries.lock().get(key).cloned()
    }

    fn insert(&self, key: CacheKey, computation: Computation<T>) {
        self.entries.lock().insert(key, computation);
    }
}

/// A bounded in-memory store backed by [`moka`].
///
/// Entries are evicted by the cache's LRU-ish policy once `max_capacity` is
/// reached; an evicted entry simply means the next call for that key spawns a
/// fresh computation.
pub struct MokaStore<T> {
    entries: moka::sync::Cache<CacheKey, Computation<T>>,
}

impl<T> MokaStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64) -> Self {
        Self {
            entries: moka::sync::Cache::new(max_capacity),
        }
    }
}

impl<T> CacheStore<T> for MokaStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &CacheKey) -> Option<Computation<T>> {
        self.entries.get(key)
    }

    fn insert(&self, key: CacheKey, computation: Computation<T>) {
        self.entries.insert(key, computation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        let key = CacheKey::new(&b"{}"[..]);

        store.insert(key.clone(), Computation::spawn(async { Ok(1u32) }));
        store.insert(key.clone(), Computation::spawn(async { Ok(2u32) }));

        assert_eq!(store.len(), 1);
        let current = store.get(&key).unwrap();
        assert_eq!(current.wait().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_moka_store_round_trip() {
        let store = MokaStore::new(16);
        let key = CacheKey::new(&b"{}"[..]);

        assert!(store.get(&key).is_none());
        store.insert(key.clone(), Computation::spawn(async { Ok(7u32) }));
        let current = store.get(&key).unwrap();
        assert_eq!(current.wait().await.unwrap(), 7);
    }
}
