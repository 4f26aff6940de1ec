//! Store contracts consumed by the engine.
//!
//! The engine owns no data. Node rows and association rows live in an
//! external store that implements [`NodeStore`] and [`AssociationStore`].
//! [`MemoryStore`](crate::MemoryStore) is the in-process implementation;
//! relational backends live in their own crates.
//!
//! # Example: a read-only association view
//!
//! ```ignore
//! use std::collections::{HashMap, HashSet};
//! use vocab_index::{AssociationStore, HolderId, ItemId, VocabResult};
//!
//! struct Assignments {
//!     holders: HashSet<HolderId>,
//!     rows: Vec<(HolderId, ItemId)>,
//! }
//!
//! impl AssociationStore for Assignments {
//!     fn holder_ids(&self) -> VocabResult<HashSet<HolderId>> {
//!         Ok(self.holders.clone())
//!     }
//!
//!     fn distinct_item_counts(&self, items: &[ItemId]) -> VocabResult<HashMap<HolderId, usize>> {
//!         // GROUP BY holder_id, COUNT(DISTINCT item_id) WHERE item_id IN items
//!         todo!()
//!     }
//!
//!     fn assignment_counts(&self, holders: &[HolderId]) -> VocabResult<HashMap<HolderId, usize>> {
//!         // GROUP BY holder_id, COUNT(DISTINCT item_id) WHERE holder_id IN holders
//!         todo!()
//!     }
//! }
//! ```

use std::collections::{HashMap, HashSet};

use crate::error::VocabResult;
use crate::types::{HolderId, IndexEntry, ItemId, MaterializedPath, Node, NodeId, ParentLink};

/// Read access to indexed nodes plus a transactional rebuild entry point.
///
/// Reads reflect the last committed rebuild. A rebuild in progress is
/// invisible until [`IndexWriter::commit`] returns.
pub trait NodeStore: Send + Sync {
    /// Opens a write transaction for a full index rebuild.
    ///
    /// Dropping the returned writer without committing must discard every
    /// staged write.
    fn begin_rebuild(&mut self) -> VocabResult<Box<dyn IndexWriter + '_>>;

    /// Looks up a single node.
    fn node(&self, id: NodeId) -> VocabResult<Option<Node>>;

    /// Looks up several nodes. Unknown ids are omitted; order is unspecified.
    fn nodes(&self, ids: &[NodeId]) -> VocabResult<Vec<Node>>;

    /// All nodes whose path has `path` as a strict prefix, in any order.
    fn nodes_below(&self, path: &MaterializedPath) -> VocabResult<Vec<Node>>;

    /// Nodes whose path is `path` extended by exactly one id, in any order.
    fn child_nodes(&self, path: &MaterializedPath) -> VocabResult<Vec<Node>>;

    /// All nodes without a parent, in any order.
    fn roots(&self) -> VocabResult<Vec<Node>>;

    /// Counter bumped by every committed rebuild. Starts at 0.
    fn index_generation(&self) -> VocabResult<u64>;
}

/// A rebuild transaction.
///
/// Reads made through the writer see the same snapshot the rebuild
/// overwrites.
pub trait IndexWriter {
    /// Every node's `(id, parent_id)` pair.
    fn parent_links(&self) -> VocabResult<Vec<ParentLink>>;

    /// Stages derived fields. May be called more than once per rebuild.
    fn write_entries(&mut self, entries: &[IndexEntry]) -> VocabResult<()>;

    /// Publishes the staged writes atomically and returns the new index
    /// generation.
    fn commit(self: Box<Self>) -> VocabResult<u64>;
}

/// Aggregate read access to the holder↔item association.
///
/// Implementations are expected to push the grouping down to the store
/// (`GROUP BY holder_id`) rather than return raw rows.
pub trait AssociationStore: Send + Sync {
    /// Every known holder, including holders without any association.
    fn holder_ids(&self) -> VocabResult<HashSet<HolderId>>;

    /// Per holder, the number of **distinct** items among `items` it is
    /// assigned. Holders matching none of `items` are absent.
    fn distinct_item_counts(&self, items: &[ItemId]) -> VocabResult<HashMap<HolderId, usize>>;

    /// Per holder in `holders`, the number of distinct items assigned
    /// across the whole item domain. Holders without associations may be
    /// absent.
    fn assignment_counts(&self, holders: &[HolderId]) -> VocabResult<HashMap<HolderId, usize>>;
}
