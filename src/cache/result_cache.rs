//! In-memory TTL cache of completed dependency graphs.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::CacheKey;
use crate::graph::DependencyGraph;

/// Default time-to-live for cached graphs.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Errors raised by cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache was used before [`DependencyCache::initialize`].
    #[error("Dependency cache used before initialization (operation: {0})")]
    NotInitialized(&'static str),
}

/// Cache construction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied when neither the read nor the write supplies one
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
        }
    }
}

/// Options for [`DependencyCache::get`] and [`DependencyCache::has`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    /// Overrides the entry's TTL for this lookup
    pub timeout: Option<Duration>,
}

/// Options for [`DependencyCache::set`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SetOptions {
    /// Replace an existing live entry
    pub force: bool,
    /// TTL for this entry; the cache default when absent
    pub ttl: Option<Duration>,
}

/// A stored graph snapshot.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub graph: DependencyGraph,
    /// Diagnostic hash of the serialized graph
    pub content_hash: String,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, timeout: Option<Duration>) -> bool {
        now.duration_since(self.created_at) > timeout.unwrap_or(self.ttl)
    }
}

/// Snapshot of cache counters and derived statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries removed by expiry or explicit delete
    pub invalidations: u64,
    pub oldest_entry_age: Option<Duration>,
    pub average_age: Duration,
}

/// TTL-bound cache of dependency graphs, keyed by request fingerprint.
///
/// The cache must be [`initialize`](Self::initialize)d before use and
/// [`clear`](Self::clear)ed on teardown. A write never replaces a live
/// entry unless forced, so repeated analyses keep serving the first graph
/// until it expires.
///
/// # Example
///
/// ```rust
/// use depscope::cache::{CacheKey, DependencyCache, GetOptions, SetOptions};
/// use depscope::graph::DependencyGraph;
///
/// let mut cache = DependencyCache::default();
/// cache.initialize();
///
/// let key = CacheKey::from("deps:example");
/// cache.set(&key, DependencyGraph::new(), SetOptions::default()).unwrap();
/// assert!(cache.get(&key, GetOptions::default()).unwrap().is_some());
/// ```
#[derive(Debug, Default)]
pub struct DependencyCache {
    config: CacheConfig,
    initialized: bool,
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
    invalidations: u64,
}

impl DependencyCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Marks the cache ready for use. Calling it again is harmless.
    pub fn initialize(&mut self) {
        if !self.initialized {
            debug!(default_ttl = ?self.config.default_ttl, "dependency cache initialized");
        }
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self, operation: &'static str) -> Result<(), CacheError> {
        if self.initialized {
            Ok(())
        } else {
            Err(CacheError::NotInitialized(operation))
        }
    }

    /// Evicts `key` if it has outlived its TTL. Returns true if the key is
    /// present and live afterwards.
    fn evict_if_expired(&mut self, key: &CacheKey, timeout: Option<Duration>) -> bool {
        let expired = match self.entries.get(key) {
            None => return false,
            Some(entry) => entry.is_expired(Instant::now(), timeout),
        };

        if expired {
            self.entries.remove(key);
            self.invalidations += 1;
            debug!(key = %key, "cache entry expired");
            return false;
        }
        true
    }

    /// Looks up a graph. Expired entries are evicted and reported as a miss.
    pub fn get(&mut self, key: &CacheKey, opts: GetOptions) -> Result<Option<DependencyGraph>, CacheError> {
        self.ensure_initialized("get")?;

        if !self.evict_if_expired(key, opts.timeout) {
            self.misses += 1;
            trace!(key = %key, "cache miss");
            return Ok(None);
        }

        self.hits += 1;
        trace!(key = %key, "cache hit");
        Ok(self.entries.get(key).map(|entry| entry.graph.clone()))
    }

    /// Stores a graph unless a live entry exists and `opts.force` is unset.
    ///
    /// Returns true if the entry was written.
    pub fn set(&mut self, key: &CacheKey, graph: DependencyGraph, opts: SetOptions) -> Result<bool, CacheError> {
        self.ensure_initialized("set")?;

        let content_hash = graph.content_hash();
        if !opts.force && self.evict_if_expired(key, None) {
            trace!(key = %key, "cache entry exists, not overwriting");
            return Ok(false);
        }

        let ttl = opts.ttl.unwrap_or(self.config.default_ttl);
        debug!(key = %key, hash = %content_hash, ?ttl, force = opts.force, "cache write");
        self.entries.insert(
            key.clone(),
            CacheEntry {
                graph,
                content_hash,
                created_at: Instant::now(),
                ttl,
            },
        );
        Ok(true)
    }

    /// Checks for a live entry, evicting it if expired.
    pub fn has(&mut self, key: &CacheKey, opts: GetOptions) -> Result<bool, CacheError> {
        self.ensure_initialized("has")?;
        Ok(self.evict_if_expired(key, opts.timeout))
    }

    /// The diagnostic content hash of a stored entry, without TTL checks.
    pub fn content_hash(&self, key: &CacheKey) -> Option<&str> {
        self.entries.get(key).map(|e| e.content_hash.as_str())
    }

    /// Removes one entry. Returns true if it existed.
    pub fn delete(&mut self, key: &CacheKey) -> Result<bool, CacheError> {
        self.ensure_initialized("delete")?;
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.invalidations += 1;
        }
        Ok(removed)
    }

    /// Drops every entry and resets all counters.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
        self.invalidations = 0;
        debug!(dropped, "dependency cache cleared");
    }

    /// Number of stored entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters plus size and age statistics.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let ages: Vec<Duration> = self
            .entries
            .values()
            .map(|e| now.duration_since(e.created_at))
            .collect();

        let average_age = if ages.is_empty() {
            Duration::ZERO
        } else {
            ages.iter().sum::<Duration>() / ages.len() as u32
        };

        CacheStats {
            size: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            invalidations: self.invalidations,
            oldest_entry_age: ages.iter().max().copied(),
            average_age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn ready() -> DependencyCache {
        let mut cache = DependencyCache::new(CacheConfig::default());
        cache.initialize();
        cache
    }

    fn graph(edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (from, to) in edges {
            graph.add_dependency(*from, *to);
        }
        graph
    }

    #[test]
    fn test_uninitialized_fails_fast() {
        let mut cache = DependencyCache::default();
        let key = CacheKey::from("k");
        assert!(matches!(
            cache.get(&key, GetOptions::default()),
            Err(CacheError::NotInitialized("get"))
        ));
        assert!(cache.set(&key, DependencyGraph::new(), SetOptions::default()).is_err());
        assert!(cache.has(&key, GetOptions::default()).is_err());
        assert!(cache.delete(&key).is_err());
        assert!(!cache.is_initialized());
    }

    #[test]
    fn test_miss_then_hit() {
        let mut cache = ready();
        let key = CacheKey::from("k");

        assert!(cache.get(&key, GetOptions::default()).unwrap().is_none());
        cache.set(&key, graph(&[("a", "b")]), SetOptions::default()).unwrap();

        let cached = cache.get(&key, GetOptions::default()).unwrap().unwrap();
        assert_eq!(cached, graph(&[("a", "b")]));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_set_does_not_overwrite_live_entry() {
        let mut cache = ready();
        let key = CacheKey::from("k");

        assert!(cache.set(&key, graph(&[("a", "b")]), SetOptions::default()).unwrap());
        assert!(!cache.set(&key, graph(&[("x", "y")]), SetOptions::default()).unwrap());

        let cached = cache.get(&key, GetOptions::default()).unwrap().unwrap();
        assert_eq!(cached, graph(&[("a", "b")]));
    }

    #[test]
    fn test_force_overwrites() {
        let mut cache = ready();
        let key = CacheKey::from("k");
        cache.set(&key, graph(&[("a", "b")]), SetOptions::default()).unwrap();

        let force = SetOptions {
            force: true,
            ..SetOptions::default()
        };
        assert!(cache.set(&key, graph(&[("x", "y")]), force).unwrap());
        assert_eq!(
            cache.get(&key, GetOptions::default()).unwrap().unwrap(),
            graph(&[("x", "y")])
        );
        assert_eq!(
            cache.content_hash(&key),
            Some(graph(&[("x", "y")]).content_hash().as_str())
        );
    }

    #[test]
    fn test_entry_ttl_eviction_on_get() {
        let mut cache = ready();
        let key = CacheKey::from("k");
        let short = SetOptions {
            ttl: Some(Duration::from_millis(10)),
            ..SetOptions::default()
        };
        cache.set(&key, graph(&[("a", "b")]), short).unwrap();
        sleep(Duration::from_millis(30));

        assert!(cache.get(&key, GetOptions::default()).unwrap().is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_timeout_override_on_has() {
        let mut cache = ready();
        let key = CacheKey::from("k");
        cache.set(&key, graph(&[("a", "b")]), SetOptions::default()).unwrap();
        sleep(Duration::from_millis(20));

        assert!(cache.has(&key, GetOptions::default()).unwrap());
        let strict = GetOptions {
            timeout: Some(Duration::from_millis(1)),
        };
        assert!(!cache.has(&key, strict).unwrap());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_expired_entry_replaced_without_force() {
        let mut cache = ready();
        let key = CacheKey::from("k");
        let short = SetOptions {
            ttl: Some(Duration::from_millis(5)),
            ..SetOptions::default()
        };
        cache.set(&key, graph(&[("a", "b")]), short).unwrap();
        sleep(Duration::from_millis(20));

        assert!(cache.set(&key, graph(&[("x", "y")]), SetOptions::default()).unwrap());
        assert_eq!(
            cache.get(&key, GetOptions::default()).unwrap().unwrap(),
            graph(&[("x", "y")])
        );
    }

    #[test]
    fn test_delete_and_clear() {
        let mut cache = ready();
        let a = CacheKey::from("a");
        let b = CacheKey::from("b");
        cache.set(&a, graph(&[("a", "b")]), SetOptions::default()).unwrap();
        cache.set(&b, graph(&[("c", "d")]), SetOptions::default()).unwrap();
        cache.get(&a, GetOptions::default()).unwrap();

        assert!(cache.delete(&a).unwrap());
        assert!(!cache.delete(&a).unwrap());
        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.invalidations, 1);
        assert!(stats.oldest_entry_age.is_some());

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.is_initialized());
    }

    #[test]
    fn test_stats_ages() {
        let mut cache = ready();
        cache
            .set(&CacheKey::from("old"), DependencyGraph::new(), SetOptions::default())
            .unwrap();
        sleep(Duration::from_millis(15));
        cache
            .set(&CacheKey::from("new"), DependencyGraph::new(), SetOptions::default())
            .unwrap();

        let stats = cache.stats();
        let oldest = stats.oldest_entry_age.unwrap();
        assert!(oldest >= Duration::from_millis(15));
        assert!(stats.average_age <= oldest);
    }
}
