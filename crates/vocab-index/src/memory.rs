//! In-process store implementing both store contracts.
//!
//! Useful for tests and for small hierarchies that fit in memory. Rebuild
//! writes are staged in the writer and only applied on commit, matching
//! the all-or-nothing behaviour expected from transactional backends.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::{VocabError, VocabResult};
use crate::traits::{AssociationStore, IndexWriter, NodeStore};
use crate::types::{
    Association, HolderId, IndexEntry, ItemId, MaterializedPath, Node, NodeId, ParentLink,
};

#[derive(Debug, Clone)]
struct NodeRecord {
    parent_id: Option<NodeId>,
    path: Option<MaterializedPath>,
    terminal: bool,
}

/// In-memory node and association store.
///
/// Association rows are kept as inserted; [`insert_row`](Self::insert_row)
/// does not de-duplicate, so it can model stores that lack a uniqueness
/// constraint.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: BTreeMap<NodeId, NodeRecord>,
    holders: BTreeSet<HolderId>,
    rows: Vec<Association>,
    generation: u64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, or replaces its parent link if it already exists.
    ///
    /// Derived fields are left untouched until the next rebuild.
    pub fn add_node(&mut self, id: NodeId, parent_id: Option<NodeId>) {
        self.nodes
            .entry(id)
            .and_modify(|record| record.parent_id = parent_id)
            .or_insert(NodeRecord {
                parent_id,
                path: None,
                terminal: false,
            });
    }

    /// Changes the parent of an existing node.
    pub fn set_parent(&mut self, id: NodeId, parent_id: Option<NodeId>) -> VocabResult<()> {
        let record = self.nodes.get_mut(&id).ok_or(VocabError::NotFound(id))?;
        record.parent_id = parent_id;
        Ok(())
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Registers a holder, with or without associations.
    pub fn add_holder(&mut self, holder_id: HolderId) {
        self.holders.insert(holder_id);
    }

    /// Assigns `item_id` to `holder_id` unless already assigned.
    pub fn assign(&mut self, holder_id: HolderId, item_id: ItemId) {
        let row = Association::new(holder_id, item_id);
        self.holders.insert(holder_id);
        if !self.rows.contains(&row) {
            self.rows.push(row);
        }
    }

    /// Appends an association row without checking for an existing pair.
    pub fn insert_row(&mut self, holder_id: HolderId, item_id: ItemId) {
        self.holders.insert(holder_id);
        self.rows.push(Association::new(holder_id, item_id));
    }

    /// Removes every row for the pair. The holder stays registered.
    pub fn unassign(&mut self, holder_id: HolderId, item_id: ItemId) {
        self.rows
            .retain(|row| !(row.holder_id == holder_id && row.item_id == item_id));
    }

    /// Association rows, in insertion order.
    pub fn associations(&self) -> &[Association] {
        &self.rows
    }

    fn to_node(id: NodeId, record: &NodeRecord) -> Node {
        Node {
            id,
            parent_id: record.parent_id,
            path: record.path.clone(),
            terminal: record.terminal,
        }
    }
}

impl NodeStore for MemoryStore {
    fn begin_rebuild(&mut self) -> VocabResult<Box<dyn IndexWriter + '_>> {
        Ok(Box::new(MemoryRebuild {
            store: self,
            staged: Vec::new(),
        }))
    }

    fn node(&self, id: NodeId) -> VocabResult<Option<Node>> {
        Ok(self.nodes.get(&id).map(|record| Self::to_node(id, record)))
    }

    fn nodes(&self, ids: &[NodeId]) -> VocabResult<Vec<Node>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|record| Self::to_node(*id, record)))
            .collect())
    }

    fn nodes_below(&self, path: &MaterializedPath) -> VocabResult<Vec<Node>> {
        Ok(self
            .nodes
            .iter()
            .filter(|(_, record)| {
                record
                    .path
                    .as_ref()
                    .is_some_and(|candidate| path.is_strict_prefix_of(candidate))
            })
            .map(|(id, record)| Self::to_node(*id, record))
            .collect())
    }

    fn child_nodes(&self, path: &MaterializedPath) -> VocabResult<Vec<Node>> {
        Ok(self
            .nodes
            .iter()
            .filter(|(_, record)| {
                record.path.as_ref().is_some_and(|candidate| {
                    candidate.len() == path.len() + 1 && path.is_strict_prefix_of(candidate)
                })
            })
            .map(|(id, record)| Self::to_node(*id, record))
            .collect())
    }

    fn roots(&self) -> VocabResult<Vec<Node>> {
        Ok(self
            .nodes
            .iter()
            .filter(|(_, record)| record.parent_id.is_none())
            .map(|(id, record)| Self::to_node(*id, record))
            .collect())
    }

    fn index_generation(&self) -> VocabResult<u64> {
        Ok(self.generation)
    }
}

/// Rebuild transaction over a [`MemoryStore`]. Dropping it discards the
/// staged entries.
struct MemoryRebuild<'a> {
    store: &'a mut MemoryStore,
    staged: Vec<IndexEntry>,
}

impl IndexWriter for MemoryRebuild<'_> {
    fn parent_links(&self) -> VocabResult<Vec<ParentLink>> {
        Ok(self
            .store
            .nodes
            .iter()
            .map(|(id, record)| ParentLink::new(*id, record.parent_id))
            .collect())
    }

    fn write_entries(&mut self, entries: &[IndexEntry]) -> VocabResult<()> {
        for entry in entries {
            if !self.store.nodes.contains_key(&entry.id) {
                return Err(VocabError::NotFound(entry.id));
            }
        }
        self.staged.extend_from_slice(entries);
        Ok(())
    }

    fn commit(self: Box<Self>) -> VocabResult<u64> {
        let MemoryRebuild { store, staged } = *self;
        for entry in staged {
            if let Some(record) = store.nodes.get_mut(&entry.id) {
                record.path = Some(entry.path);
                record.terminal = entry.terminal;
            }
        }
        store.generation += 1;
        Ok(store.generation)
    }
}

impl AssociationStore for MemoryStore {
    fn holder_ids(&self) -> VocabResult<HashSet<HolderId>> {
        Ok(self.holders.iter().copied().collect())
    }

    fn distinct_item_counts(&self, items: &[ItemId]) -> VocabResult<HashMap<HolderId, usize>> {
        let wanted: HashSet<ItemId> = items.iter().copied().collect();
        let mut matched: HashMap<HolderId, HashSet<ItemId>> = HashMap::new();
        for row in self.rows.iter().filter(|row| wanted.contains(&row.item_id)) {
            matched.entry(row.holder_id).or_default().insert(row.item_id);
        }
        Ok(matched
            .into_iter()
            .map(|(holder, items)| (holder, items.len()))
            .collect())
    }

    fn assignment_counts(&self, holders: &[HolderId]) -> VocabResult<HashMap<HolderId, usize>> {
        let wanted: HashSet<HolderId> = holders.iter().copied().collect();
        let mut assigned: HashMap<HolderId, HashSet<ItemId>> = HashMap::new();
        for row in self.rows.iter().filter(|row| wanted.contains(&row.holder_id)) {
            assigned.entry(row.holder_id).or_default().insert(row.item_id);
        }
        Ok(assigned
            .into_iter()
            .map(|(holder, items)| (holder, items.len()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncommitted_rebuild_is_discarded() {
        let mut store = MemoryStore::new();
        store.add_node(1, None);

        {
            let mut writer = store.begin_rebuild().unwrap();
            writer
                .write_entries(&[IndexEntry {
                    id: 1,
                    path: MaterializedPath::root(1),
                    terminal: true,
                }])
                .unwrap();
            // dropped without commit
        }

        let node = store.node(1).unwrap().unwrap();
        assert!(node.path.is_none());
        assert_eq!(store.index_generation().unwrap(), 0);
    }

    #[test]
    fn test_commit_bumps_generation() {
        let mut store = MemoryStore::new();
        store.add_node(1, None);

        let mut writer = store.begin_rebuild().unwrap();
        writer
            .write_entries(&[IndexEntry {
                id: 1,
                path: MaterializedPath::root(1),
                terminal: true,
            }])
            .unwrap();
        assert_eq!(writer.commit().unwrap(), 1);

        let node = store.node(1).unwrap().unwrap();
        assert_eq!(node.path, Some(MaterializedPath::root(1)));
        assert!(node.terminal);
    }

    #[test]
    fn test_write_unknown_node_fails() {
        let mut store = MemoryStore::new();
        let mut writer = store.begin_rebuild().unwrap();
        let err = writer
            .write_entries(&[IndexEntry {
                id: 8,
                path: MaterializedPath::root(8),
                terminal: true,
            }])
            .unwrap_err();
        assert!(matches!(err, VocabError::NotFound(8)));
    }

    #[test]
    fn test_assign_is_idempotent() {
        let mut store = MemoryStore::new();
        store.assign(1, 3);
        store.assign(1, 3);
        assert_eq!(store.associations().len(), 1);

        store.insert_row(1, 3);
        assert_eq!(store.associations().len(), 2);

        store.unassign(1, 3);
        assert!(store.associations().is_empty());
        assert!(store.holder_ids().unwrap().contains(&1));
    }

    #[test]
    fn test_distinct_item_counts() {
        let mut store = MemoryStore::new();
        store.insert_row(1, 3);
        store.insert_row(1, 3);
        store.assign(1, 4);
        store.assign(2, 5);

        let counts = store.distinct_item_counts(&[3, 4]).unwrap();
        assert_eq!(counts.get(&1), Some(&2));
        assert_eq!(counts.get(&2), None);

        let totals = store.assignment_counts(&[1, 2]).unwrap();
        assert_eq!(totals.get(&1), Some(&2));
        assert_eq!(totals.get(&2), Some(&1));
    }

    #[test]
    fn test_child_nodes_one_level() {
        let mut store = MemoryStore::new();
        store.add_node(1, None);
        store.add_node(2, Some(1));
        store.add_node(3, Some(2));
        crate::PathIndexBuilder::rebuild(&mut store).unwrap();

        let children = store.child_nodes(&MaterializedPath::root(1)).unwrap();
        assert_eq!(children.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_set_parent_unknown() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.set_parent(4, None),
            Err(VocabError::NotFound(4))
        ));
    }
}
