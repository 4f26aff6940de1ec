//! # vocab-index
//!
//! Hierarchy indexing and set-membership queries over a relational store.
//!
//! This crate provides two query capabilities and the maintenance
//! operation that keeps the first one correct:
//!
//! - **Path index** - every node of a forest stores its materialized path
//!   (ids from its root down to itself), so ancestors, descendants and
//!   terminal checks are single reads instead of recursive walks.
//! - **Membership evaluator** - answers `requires_any`, `requires_all`,
//!   `excludes_any`, `excludes_all` and `only` over a holder↔item
//!   association by grouping association rows per holder.
//! - **Rebuild** - recomputes every path and terminal flag from parent
//!   links inside one store transaction.
//!
//! ## Quick Start
//!
//! ```rust
//! use vocab_index::{
//!     HierarchyQuery, MembershipEvaluator, MemoryStore, Operator, PathIndexBuilder,
//! };
//!
//! let mut store = MemoryStore::new();
//! store.add_node(3, None);
//! store.add_node(4, Some(3));
//! store.add_node(6, Some(3));
//! store.assign(1, 4);
//! store.assign(2, 9);
//! PathIndexBuilder::rebuild(&mut store).unwrap();
//!
//! // Expand "item 3 and everything below it" ...
//! let query = HierarchyQuery::new(&store);
//! let root = query.node(3).unwrap();
//! let items: Vec<u64> = query
//!     .descendants_or_self(&root)
//!     .unwrap()
//!     .iter()
//!     .map(|n| n.id)
//!     .collect();
//!
//! // ... then ask who holds any of them.
//! let evaluator = MembershipEvaluator::new(&store);
//! let holders = evaluator.evaluate(Operator::RequiresAny, &items).unwrap();
//! assert_eq!(holders.to_vec(), vec![1]);
//! ```
//!
//! ## Operators
//!
//! | Operator | Name(s) | Holder qualifies when |
//! |----------|---------|-----------------------|
//! | [`Operator::RequiresAny`] | `requires_any`, `in` | assigned at least one value |
//! | [`Operator::RequiresAll`] | `requires_all`, `all` | assigned every value |
//! | [`Operator::ExcludesAny`] | `excludes_any`, `-in` | missing at least one value |
//! | [`Operator::ExcludesAll`] | `excludes_all`, `-all` | assigned none of the values |
//! | [`Operator::Only`] | `only` | assigned exactly the values |
//!
//! ## Consistency
//!
//! Hierarchy answers reflect the last committed rebuild. Parent links
//! edited after that are invisible to ancestor/descendant queries until
//! [`PathIndexBuilder::rebuild`] runs again. Membership answers need no
//! index and reflect the association rows at query time.
//!
//! ## Feature Flags
//!
//! - `serde` - derives `Serialize`/`Deserialize` for the public data types
//!
//! ## Architecture
//!
//! ```text
//! PathIndexBuilder     ─┐
//! HierarchyQuery       ─┼─ NodeStore ────────┐
//! MembershipEvaluator  ─── AssociationStore ─┼─ MemoryStore (this crate)
//!                                            └─ SqliteStore (vocab-index-sqlite)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod builder;
mod cache;
mod config;
mod error;
mod hierarchy;
mod membership;
mod memory;
mod operator;
mod result;
mod traits;
mod types;

// Public re-exports
pub use builder::PathIndexBuilder;
pub use cache::{CacheStats, HierarchyCache};
pub use config::{CacheConfig, QueryConfig, QueryConfigBuilder};
pub use error::{VocabError, VocabResult};
pub use hierarchy::HierarchyQuery;
pub use membership::MembershipEvaluator;
pub use memory::MemoryStore;
pub use operator::Operator;
pub use result::{EvaluationStats, MembershipResult, RebuildReport};
pub use traits::{AssociationStore, IndexWriter, NodeStore};
pub use types::{
    Association, HolderId, IndexEntry, ItemId, MaterializedPath, Node, NodeId, ParentLink,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _: Option<QueryConfig> = None;
        let _: Option<CacheConfig> = None;
        let _: Option<MembershipResult> = None;
        let _: Option<RebuildReport> = None;
        let _: Option<VocabResult<()>> = None;
    }

    #[test]
    fn test_memory_store_is_both_stores() {
        fn assert_node_store<T: NodeStore>() {}
        fn assert_association_store<T: AssociationStore>() {}
        assert_node_store::<MemoryStore>();
        assert_association_store::<MemoryStore>();
    }
}
