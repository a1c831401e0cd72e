//! Dependency result cache.
//!
//! Completed graphs are cached in memory for the lifetime of the process,
//! keyed by a [`CacheKey`] fingerprint over the analysis inputs. Entries
//! expire by TTL and are never refreshed by an ordinary write.

mod fingerprint;
mod result_cache;

pub use fingerprint::CacheKey;
pub use result_cache::{
    CacheConfig, CacheEntry, CacheError, CacheStats, DependencyCache, GetOptions, SetOptions,
    DEFAULT_TTL,
};
