//! Descendant result caching for hierarchy queries.
//!
//! Provides an LRU cache with TTL expiration for descendant lists, keyed by
//! the materialized path that was scanned. Every entry remembers the index
//! generation it was computed against; a lookup under a different
//! generation is a miss, so a committed rebuild invalidates the whole cache
//! without touching it.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::config::CacheConfig;
use crate::types::{MaterializedPath, Node};

/// A cached descendant list with expiration tracking.
#[derive(Debug, Clone)]
struct CacheEntry {
    nodes: Vec<Node>,
    generation: u64,
    created_at: Instant,
}

impl CacheEntry {
    fn new(nodes: Vec<Node>, generation: u64) -> Self {
        Self {
            nodes,
            generation,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Thread-safe LRU cache of descendant lists keyed by the scanned path.
///
/// Keying on the path rather than the node id means a `Node` read before a
/// rebuild can never populate the entry another caller reads for the
/// node's current path.
///
/// # Example
///
/// ```ignore
/// let cache = HierarchyCache::new(CacheConfig::default());
/// cache.set(path.clone(), generation, descendants.clone());
/// assert_eq!(cache.get(&path, generation), Some(descendants));
/// assert_eq!(cache.get(&path, generation + 1), None);
/// ```
pub struct HierarchyCache {
    inner: Mutex<LruCache<MaterializedPath, CacheEntry>>,
    ttl: Duration,
}

impl HierarchyCache {
    /// Creates a new cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_capacity(config.max_entries, config.ttl)
    }

    /// Creates a cache with custom capacity and TTL.
    pub fn with_capacity(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Gets the descendants cached for `path` under `generation`.
    ///
    /// Stale (other generation) and expired entries are evicted and
    /// reported as a miss. A hit promotes the entry to most-recently-used.
    pub fn get(&self, path: &MaterializedPath, generation: u64) -> Option<Vec<Node>> {
        let mut cache = self.inner.lock();

        let usable = match cache.get(path) {
            Some(entry) => entry.generation == generation && !entry.is_expired(self.ttl),
            None => return None,
        };

        if usable {
            cache.get(path).map(|entry| entry.nodes.clone())
        } else {
            cache.pop(path);
            None
        }
    }

    /// Stores the descendants found below `path` under `generation`.
    pub fn set(&self, path: MaterializedPath, generation: u64, nodes: Vec<Node>) {
        self.inner
            .lock()
            .put(path, CacheEntry::new(nodes, generation));
    }

    /// Returns the number of entries, including stale ones not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all entries from the cache.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Returns cache statistics relative to `generation`.
    pub fn stats(&self, generation: u64) -> CacheStats {
        let cache = self.inner.lock();
        let total = cache.len();
        let stale = cache
            .iter()
            .filter(|(_, entry)| entry.generation != generation || entry.is_expired(self.ttl))
            .count();

        CacheStats {
            total_entries: total,
            stale_entries: stale,
            valid_entries: total.saturating_sub(stale),
        }
    }
}

impl std::fmt::Debug for HierarchyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Statistics about the cache state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries in the cache.
    pub total_entries: usize,
    /// Entries computed under another generation or past their TTL.
    pub stale_entries: usize,
    /// Entries that would be served.
    pub valid_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn key(ids: &[u64]) -> MaterializedPath {
        MaterializedPath::from(ids.to_vec())
    }

    fn node(id: u64) -> Node {
        Node {
            id,
            parent_id: None,
            path: None,
            terminal: true,
        }
    }

    #[test]
    fn test_cache_set_get() {
        let cache = HierarchyCache::with_capacity(10, Duration::from_secs(300));
        cache.set(key(&[3]), 1, vec![node(4), node(6)]);

        let cached = cache.get(&key(&[3]), 1).expect("should be cached");
        assert_eq!(cached.iter().map(|n| n.id).collect::<Vec<_>>(), vec![4, 6]);
    }

    #[test]
    fn test_cache_miss() {
        let cache = HierarchyCache::with_capacity(10, Duration::from_secs(300));
        assert!(cache.get(&key(&[3]), 1).is_none());
    }

    #[test]
    fn test_generation_change_invalidates() {
        let cache = HierarchyCache::with_capacity(10, Duration::from_secs(300));
        cache.set(key(&[3]), 1, vec![node(4)]);

        assert!(cache.get(&key(&[3]), 2).is_none());
        // The stale entry was evicted on lookup.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ttl_expiration() {
        let cache = HierarchyCache::with_capacity(10, Duration::from_millis(10));
        cache.set(key(&[3]), 1, vec![node(4)]);
        thread::sleep(Duration::from_millis(30));

        assert!(cache.get(&key(&[3]), 1).is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = HierarchyCache::with_capacity(2, Duration::from_secs(300));
        cache.set(key(&[1]), 1, vec![]);
        cache.set(key(&[2]), 1, vec![]);
        // Touch 1 so 2 becomes least recently used.
        assert!(cache.get(&key(&[1]), 1).is_some());
        cache.set(key(&[3]), 1, vec![]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(&[1]), 1).is_some());
        assert!(cache.get(&key(&[2]), 1).is_none());
        assert!(cache.get(&key(&[3]), 1).is_some());
    }

    #[test]
    fn test_same_node_under_other_path_is_a_miss() {
        let cache = HierarchyCache::with_capacity(10, Duration::from_secs(300));
        cache.set(key(&[3, 4]), 2, vec![]);

        assert!(cache.get(&key(&[1, 4]), 2).is_none());
        assert!(cache.get(&key(&[3, 4]), 2).is_some());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = HierarchyCache::with_capacity(0, Duration::from_secs(300));
        cache.set(key(&[1]), 1, vec![]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats() {
        let cache = HierarchyCache::with_capacity(10, Duration::from_secs(300));
        cache.set(key(&[1]), 1, vec![]);
        cache.set(key(&[2]), 2, vec![]);

        let stats = cache.stats(2);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.stale_entries, 1);
        assert_eq!(stats.valid_entries, 1);
    }

    #[test]
    fn test_clear() {
        let cache = HierarchyCache::new(CacheConfig::default());
        cache.set(key(&[1]), 1, vec![]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
