//! Ancestor, descendant and terminal queries over the path index.
//!
//! Every query is a single store read: ancestors are the ids already held
//! in a node's path, descendants are one range scan over path prefixes.
//! Results reflect the last committed rebuild; parent links edited since
//! then are not visible here until the index is rebuilt.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::cache::{CacheStats, HierarchyCache};
use crate::config::QueryConfig;
use crate::error::{VocabError, VocabResult};
use crate::traits::NodeStore;
use crate::types::{Node, NodeId};

/// Answers hierarchy questions from materialized paths.
///
/// # Example
///
/// ```rust
/// use vocab_index::{HierarchyQuery, MemoryStore, PathIndexBuilder};
///
/// let mut store = MemoryStore::new();
/// store.add_node(3, None);
/// store.add_node(4, Some(3));
/// store.add_node(5, Some(4));
/// PathIndexBuilder::rebuild(&mut store).unwrap();
///
/// let query = HierarchyQuery::new(&store);
/// let leaf = query.node(5).unwrap();
/// let ids: Vec<u64> = query
///     .ancestors(&leaf, true)
///     .unwrap()
///     .iter()
///     .map(|n| n.id)
///     .collect();
/// assert_eq!(ids, vec![3, 4, 5]);
/// ```
pub struct HierarchyQuery<'a> {
    store: &'a dyn NodeStore,
    config: QueryConfig,
    cache: Option<HierarchyCache>,
}

impl<'a> HierarchyQuery<'a> {
    /// Creates a query handle with the default configuration (no cache,
    /// no result limit).
    pub fn new(store: &'a dyn NodeStore) -> Self {
        Self::with_config(store, QueryConfig::default())
    }

    /// Creates a query handle with a custom configuration.
    pub fn with_config(store: &'a dyn NodeStore, config: QueryConfig) -> Self {
        let cache = config.cache.clone().map(HierarchyCache::new);
        Self {
            store,
            config,
            cache,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Loads a node by id.
    pub fn node(&self, id: NodeId) -> VocabResult<Node> {
        self.store.node(id)?.ok_or(VocabError::NotFound(id))
    }

    /// Nodes on the path of `node`, root first.
    ///
    /// With `include_self` the last element is `node` itself; without it a
    /// root yields an empty list.
    #[instrument(level = "debug", skip(self, node), fields(node = node.id))]
    pub fn ancestors(&self, node: &Node, include_self: bool) -> VocabResult<Vec<Node>> {
        let path = node.indexed_path()?.ids();
        let ids = if include_self {
            path
        } else {
            &path[..path.len().saturating_sub(1)]
        };

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<NodeId, Node> = self
            .store
            .nodes(ids)?
            .into_iter()
            .map(|n| (n.id, n))
            .collect();

        ids.iter()
            .map(|id| by_id.remove(id).ok_or(VocabError::NotFound(*id)))
            .collect()
    }

    /// All nodes strictly below `node`.
    ///
    /// Ordered breadth-first: by depth, then by path compared id by id.
    /// Empty for a terminal node. The scan follows the path carried by
    /// `node`, so a `Node` read before the last rebuild answers for the
    /// tree shape it was read under.
    #[instrument(level = "debug", skip(self, node), fields(node = node.id))]
    pub fn descendants(&self, node: &Node) -> VocabResult<Vec<Node>> {
        let nodes = self.scan_below(node)?;
        self.check_limit(nodes.len())?;
        Ok(nodes)
    }

    /// `node` followed by its descendants. `node` counts towards
    /// `max_results`.
    ///
    /// This is the usual expansion a caller performs before handing an
    /// item set to the membership evaluator.
    pub fn descendants_or_self(&self, node: &Node) -> VocabResult<Vec<Node>> {
        let below = self.scan_below(node)?;
        self.check_limit(below.len() + 1)?;

        let mut nodes = Vec::with_capacity(below.len() + 1);
        nodes.push(node.clone());
        nodes.extend(below);
        Ok(nodes)
    }

    /// Direct children of `node` as of the last rebuild, ordered by id.
    ///
    /// Reads one level only; `max_results` bounds the number of children,
    /// not the size of the subtree.
    #[instrument(level = "debug", skip(self, node), fields(node = node.id))]
    pub fn children(&self, node: &Node) -> VocabResult<Vec<Node>> {
        let mut children = self.store.child_nodes(node.indexed_path()?)?;
        self.check_limit(children.len())?;
        children.sort_by_key(|n| n.id);
        Ok(children)
    }

    /// All nodes without a parent, ordered by id.
    pub fn roots(&self) -> VocabResult<Vec<Node>> {
        let mut roots = self.store.roots()?;
        roots.sort_by_key(|n| n.id);
        Ok(roots)
    }

    /// True iff `node` had no children at the last rebuild.
    pub fn is_terminal(&self, node: &Node) -> bool {
        node.terminal
    }

    /// True iff `ancestor` lies strictly above `descendant`.
    pub fn is_ancestor_of(&self, ancestor: &Node, descendant: &Node) -> VocabResult<bool> {
        Ok(ancestor
            .indexed_path()?
            .is_strict_prefix_of(descendant.indexed_path()?))
    }

    /// Cache statistics for the current index generation, if caching is on.
    pub fn cache_stats(&self) -> VocabResult<Option<CacheStats>> {
        match &self.cache {
            Some(cache) => Ok(Some(cache.stats(self.store.index_generation()?))),
            None => Ok(None),
        }
    }

    /// Unbounded descendant read, served from the cache when enabled.
    fn scan_below(&self, node: &Node) -> VocabResult<Vec<Node>> {
        let path = node.indexed_path()?;

        let generation = match &self.cache {
            Some(_) => Some(self.store.index_generation()?),
            None => None,
        };

        if let (Some(cache), Some(generation)) = (&self.cache, generation) {
            if let Some(nodes) = cache.get(path, generation) {
                debug!(count = nodes.len(), "descendants served from cache");
                return Ok(nodes);
            }
        }

        let mut nodes = self.store.nodes_below(path)?;
        nodes.sort_by(|a, b| breadth_first_key(a).cmp(&breadth_first_key(b)));
        debug!(count = nodes.len(), "descendants read from store");

        if let (Some(cache), Some(generation)) = (&self.cache, generation) {
            cache.set(path.clone(), generation, nodes.clone());
        }
        Ok(nodes)
    }

    fn check_limit(&self, count: usize) -> VocabResult<()> {
        match self.config.max_results {
            Some(limit) if count > limit => Err(VocabError::ResultTooLarge { count, limit }),
            _ => Ok(()),
        }
    }
}

fn breadth_first_key(node: &Node) -> (usize, Option<&[NodeId]>) {
    match &node.path {
        Some(path) => (path.len(), Some(path.ids())),
        None => (usize::MAX, None),
    }
}

impl std::fmt::Debug for HierarchyQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyQuery")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}
