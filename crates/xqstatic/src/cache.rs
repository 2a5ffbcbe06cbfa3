//
// cache.rs
//
// Memoization of resolver results with interior mutability
//

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

use lru::LruCache;

use crate::dialect::DialectConfig;
use crate::namespaces::NamespaceBinding;
use crate::syntax::NodeId;
use crate::variables::VariableBinding;

/// Default capacity for each resolver cache
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Identifies one query: the tree snapshot, the node, and the dialect the
/// result was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub generation: u64,
    pub node: NodeId,
    pub dialect: DialectConfig,
}

fn capacity(cap: usize) -> NonZeroUsize {
    NonZeroUsize::new(cap).unwrap_or(NonZeroUsize::MIN)
}

/// LRU map with interior mutability.
///
/// Uses `peek()` for reads (no LRU promotion, works under read lock) and
/// `push()` for writes (promotes/evicts under write lock), so lookups from
/// concurrent batch queries never contend with each other.
pub struct ScopeCache<K: Hash + Eq, V> {
    inner: RwLock<LruCache<K, Arc<V>>>,
}

impl<K: Hash + Eq, V> std::fmt::Debug for ScopeCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeCache").finish_non_exhaustive()
    }
}

impl<K: Hash + Eq, V> Default for ScopeCache<K, V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl<K: Hash + Eq, V> ScopeCache<K, V> {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: RwLock::new(LruCache::new(capacity(cap))),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.read().ok()?.peek(key).cloned()
    }

    pub fn insert(&self, key: K, value: Arc<V>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.push(key, value);
        }
    }

    /// Return the cached value or compute, store and return it.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        self.fetch(key, compute).0
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with), also reporting
    /// whether the value was already cached.
    pub fn fetch(&self, key: K, compute: impl FnOnce() -> V) -> (Arc<V>, bool) {
        if let Some(hit) = self.get(&key) {
            return (hit, true);
        }
        let value = Arc::new(compute());
        self.insert(key, Arc::clone(&value));
        (value, false)
    }

    /// Remove every entry matching `pred`; returns how many were removed.
    pub fn invalidate_where(&self, pred: impl Fn(&K) -> bool) -> usize
    where
        K: Clone,
    {
        let Ok(mut guard) = self.inner.write() else {
            return 0;
        };
        let stale: Vec<K> = guard.iter().map(|(k, _)| k).filter(|k| pred(k)).cloned().collect();
        for key in &stale {
            guard.pop(key);
        }
        stale.len()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            guard.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize the cache capacity. If shrinking, LRU entries are evicted.
    pub fn resize(&self, cap: usize) {
        if let Ok(mut guard) = self.inner.write() {
            guard.resize(capacity(cap));
        }
    }
}

/// Caches for the position-dependent resolvers.
///
/// Function candidates are not cached: they depend on the module registry,
/// which the cache cannot fingerprint.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    pub namespaces: ScopeCache<CacheKey, Vec<NamespaceBinding>>,
    pub variables: ScopeCache<CacheKey, Vec<VariableBinding>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            namespaces: ScopeCache::with_capacity(cap),
            variables: ScopeCache::with_capacity(cap),
        }
    }

    /// Drop every entry computed for tree snapshot `generation`.
    pub fn invalidate_generation(&self, generation: u64) -> usize {
        self.namespaces.invalidate_where(|k| k.generation == generation)
            + self.variables.invalidate_where(|k| k.generation == generation)
    }

    pub fn invalidate_all(&self) {
        self.namespaces.clear();
        self.variables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(generation: u64, node: u32) -> CacheKey {
        CacheKey {
            generation,
            node: NodeId::from_raw(node),
            dialect: DialectConfig::default(),
        }
    }

    #[test]
    fn test_get_or_insert_computes_once() {
        let cache: ScopeCache<CacheKey, Vec<u32>> = ScopeCache::default();
        let mut calls = 0;
        let first = cache.get_or_insert_with(key(1, 1), || {
            calls += 1;
            vec![1, 2]
        });
        let second = cache.get_or_insert_with(key(1, 1), || {
            calls += 1;
            vec![3]
        });
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_fetch_reports_hits() {
        let cache: ScopeCache<CacheKey, u32> = ScopeCache::default();
        let (first, hit) = cache.fetch(key(1, 1), || 7);
        assert!(!hit);
        let (second, hit) = cache.fetch(key(1, 1), || 8);
        assert!(hit);
        assert_eq!((*first, *second), (7, 7));
    }

    #[test]
    fn test_dialect_is_part_of_the_key() {
        let cache: ScopeCache<CacheKey, u32> = ScopeCache::default();
        cache.insert(key(1, 1), Arc::new(1));
        let other = CacheKey {
            dialect: DialectConfig::marklogic(9),
            ..key(1, 1)
        };
        assert!(cache.get(&other).is_none());
    }

    #[test]
    fn test_capacity_evicts() {
        let cache: ScopeCache<CacheKey, u32> = ScopeCache::with_capacity(2);
        cache.insert(key(1, 1), Arc::new(1));
        cache.insert(key(1, 2), Arc::new(2));
        cache.insert(key(1, 3), Arc::new(3));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(1, 1)).is_none());

        cache.resize(1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache: ScopeCache<CacheKey, u32> = ScopeCache::with_capacity(0);
        cache.insert(key(1, 1), Arc::new(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_generation() {
        let cache = ResolutionCache::new();
        cache.variables.insert(key(1, 1), Arc::new(Vec::new()));
        cache.variables.insert(key(2, 1), Arc::new(Vec::new()));
        cache.namespaces.insert(key(1, 5), Arc::new(Vec::new()));
        assert_eq!(cache.invalidate_generation(1), 2);
        assert!(cache.variables.get(&key(2, 1)).is_some());
        cache.invalidate_all();
        assert!(cache.variables.is_empty());
        assert!(cache.namespaces.is_empty());
    }
}
