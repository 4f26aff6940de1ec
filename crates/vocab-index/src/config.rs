//! Configuration types for hierarchy queries.

use std::time::Duration;

/// Configuration for [`HierarchyQuery`](crate::HierarchyQuery).
///
/// # Example
///
/// ```rust
/// use vocab_index::{CacheConfig, QueryConfig};
///
/// let config = QueryConfig::builder()
///     .with_cache(CacheConfig::default())
///     .with_max_results(100_000)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryConfig {
    /// Descendant cache configuration (None = caching disabled).
    pub cache: Option<CacheConfig>,
    /// Maximum number of nodes a descendant query may return (None = unlimited).
    pub max_results: Option<usize>,
}

impl QueryConfig {
    /// Creates a new builder for QueryConfig.
    pub fn builder() -> QueryConfigBuilder {
        QueryConfigBuilder::default()
    }
}

/// Builder for QueryConfig.
#[derive(Debug, Clone, Default)]
pub struct QueryConfigBuilder {
    cache: Option<CacheConfig>,
    max_results: Option<usize>,
}

impl QueryConfigBuilder {
    /// Enables caching with the given configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the maximum number of results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Builds the QueryConfig.
    pub fn build(self) -> QueryConfig {
        QueryConfig {
            cache: self.cache,
            max_results: self.max_results,
        }
    }
}

/// Configuration for the descendant cache.
///
/// Cached entries are also dropped whenever the store's index generation
/// moves, so `ttl` only bounds how long an unchanged index is trusted.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached descendant lists.
    pub max_entries: usize,
    /// Time-to-live for cached entries.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(300),
        }
    }
}
