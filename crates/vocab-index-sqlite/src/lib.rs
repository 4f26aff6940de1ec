//! # vocab-index-sqlite
//!
//! SQLite-backed [`NodeStore`](vocab_index::NodeStore) and
//! [`AssociationStore`](vocab_index::AssociationStore) for `vocab-index`.
//!
//! Nodes, holders and assignments live in three tables. A rebuild runs as
//! one `IMMEDIATE` transaction, so readers on other connections see either
//! every old path or every new one, and the index generation stored next
//! to the data lets a cached [`HierarchyQuery`](vocab_index::HierarchyQuery)
//! notice a rebuild made through another connection.
//!
//! ```rust
//! use vocab_index::{HierarchyQuery, NodeStore, PathIndexBuilder};
//! use vocab_index_sqlite::SqliteStore;
//!
//! let mut store = SqliteStore::open_in_memory().unwrap();
//! store.add_node(3, None).unwrap();
//! store.add_node(4, Some(3)).unwrap();
//! store.add_node(5, Some(4)).unwrap();
//!
//! let report = PathIndexBuilder::rebuild(&mut store).unwrap();
//! assert_eq!(report.max_depth, 2);
//!
//! let query = HierarchyQuery::new(&store);
//! let leaf = query.node(5).unwrap();
//! let ancestors = query.ancestors(&leaf, false).unwrap();
//! assert_eq!(ancestors.iter().map(|n| n.id).collect::<Vec<_>>(), vec![3, 4]);
//! assert_eq!(store.index_generation().unwrap(), 1);
//! ```

#![warn(missing_docs)]

mod rebuild;
mod schema;
mod sql;
mod store;

pub use store::SqliteStore;
