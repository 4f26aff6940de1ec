//! Domain types shared by the index builder, the hierarchy queries and
//! the membership evaluator.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{VocabError, VocabResult};

/// Identifier of a tree node.
pub type NodeId = u64;

/// Identifier of an entity that is assigned items.
pub type HolderId = u64;

/// Identifier of an assignable item. In practice items are nodes.
pub type ItemId = u64;

/// Separator terminating every id in the encoded form of a path.
const SEPARATOR: char = '/';

/// Ordered sequence of node ids from a root down to a node, inclusive.
///
/// The encoded form writes every id followed by `/`, so `[3, 4, 5]`
/// becomes `"3/4/5/"`. Terminating every id keeps string prefixes aligned
/// with id boundaries: `"3/"` is a prefix of `"3/4/"` but not of `"34/"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterializedPath(Vec<NodeId>);

impl MaterializedPath {
    /// Path of a root node.
    pub fn root(id: NodeId) -> Self {
        Self(vec![id])
    }

    /// Returns this path extended by `id`.
    pub fn child(&self, id: NodeId) -> Self {
        let mut ids = Vec::with_capacity(self.0.len() + 1);
        ids.extend_from_slice(&self.0);
        ids.push(id);
        Self(ids)
    }

    /// Number of edges between the root and the last node (roots are 0).
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// The node this path leads to.
    pub fn last(&self) -> Option<NodeId> {
        self.0.last().copied()
    }

    /// The path of the parent, or `None` for a root path.
    pub fn parent_path(&self) -> Option<Self> {
        match self.0.len() {
            0 | 1 => None,
            n => Some(Self(self.0[..n - 1].to_vec())),
        }
    }

    /// Ids on the path, root first.
    pub fn ids(&self) -> &[NodeId] {
        &self.0
    }

    /// Number of ids on the path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a path with no ids (never produced by a rebuild).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `self` is a prefix of `other` and strictly shorter.
    pub fn is_strict_prefix_of(&self, other: &MaterializedPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Text encoding used by relational stores.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 4);
        for id in &self.0 {
            out.push_str(&id.to_string());
            out.push(SEPARATOR);
        }
        out
    }

    /// Parses the text encoding produced by [`encode`](Self::encode).
    pub fn decode(encoded: &str) -> VocabResult<Self> {
        let body = encoded.strip_suffix(SEPARATOR).ok_or_else(|| {
            VocabError::store(format!("malformed path encoding: {encoded:?}"))
        })?;
        body.split(SEPARATOR)
            .map(|part| {
                part.parse::<NodeId>().map_err(|_| {
                    VocabError::store(format!("malformed path encoding: {encoded:?}"))
                })
            })
            .collect::<VocabResult<Vec<_>>>()
            .map(Self)
    }

    /// Half-open string range `[lower, upper)` holding exactly the
    /// encodings of the strict descendants of this path.
    ///
    /// `upper` replaces the final `/` with `0`, the next code point, so
    /// anything sorting inside the range must start with `lower`.
    /// `lower` itself is the path's own encoding and has to be excluded
    /// by the caller (`path > lower AND path < upper`).
    pub fn descendant_range(&self) -> (String, String) {
        let lower = self.encode();
        let mut upper = lower.clone();
        upper.pop();
        upper.push('0');
        (lower, upper)
    }
}

impl From<Vec<NodeId>> for MaterializedPath {
    fn from(ids: Vec<NodeId>) -> Self {
        Self(ids)
    }
}

impl fmt::Display for MaterializedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// A tree node together with its derived index fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Parent node, `None` for roots.
    pub parent_id: Option<NodeId>,
    /// Path as of the last rebuild. `None` until the node is indexed.
    pub path: Option<MaterializedPath>,
    /// True iff no node listed this one as parent at the last rebuild.
    pub terminal: bool,
}

impl Node {
    /// Returns the indexed path or [`VocabError::IndexNotBuilt`].
    pub fn indexed_path(&self) -> VocabResult<&MaterializedPath> {
        self.path.as_ref().ok_or(VocabError::IndexNotBuilt(self.id))
    }

    /// Depth as of the last rebuild.
    pub fn depth(&self) -> Option<usize> {
        self.path.as_ref().map(MaterializedPath::depth)
    }

    /// True for nodes without a parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// One `(id, parent_id)` row read at the start of a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParentLink {
    /// Node identifier.
    pub id: NodeId,
    /// Parent node, `None` for roots.
    pub parent_id: Option<NodeId>,
}

impl ParentLink {
    /// Creates a link row.
    pub fn new(id: NodeId, parent_id: Option<NodeId>) -> Self {
        Self { id, parent_id }
    }
}

/// One `(id, path, terminal)` row written by a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexEntry {
    /// Node identifier.
    pub id: NodeId,
    /// Freshly computed path.
    pub path: MaterializedPath,
    /// Freshly computed terminal flag.
    pub terminal: bool,
}

/// A `(holder, item)` assignment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Association {
    /// The holder being assigned.
    pub holder_id: HolderId,
    /// The assigned item.
    pub item_id: ItemId,
}

impl Association {
    /// Creates an association row.
    pub fn new(holder_id: HolderId, item_id: ItemId) -> Self {
        Self { holder_id, item_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_child_and_depth() {
        let root = MaterializedPath::root(3);
        let path = root.child(4).child(5);
        assert_eq!(path.ids(), &[3, 4, 5]);
        assert_eq!(path.depth(), 2);
        assert_eq!(root.depth(), 0);
        assert_eq!(path.last(), Some(5));
    }

    #[test]
    fn test_parent_path() {
        let path = MaterializedPath::from(vec![3, 4, 5]);
        assert_eq!(path.parent_path(), Some(MaterializedPath::from(vec![3, 4])));
        assert_eq!(MaterializedPath::root(3).parent_path(), None);
    }

    #[test]
    fn test_strict_prefix() {
        let a = MaterializedPath::from(vec![3, 4]);
        let b = MaterializedPath::from(vec![3, 4, 5]);
        assert!(a.is_strict_prefix_of(&b));
        assert!(!b.is_strict_prefix_of(&a));
        assert!(!a.is_strict_prefix_of(&a));
        assert!(!MaterializedPath::from(vec![3, 5]).is_strict_prefix_of(&b));
    }

    #[test]
    fn test_encode() {
        assert_eq!(MaterializedPath::from(vec![3, 4, 5]).encode(), "3/4/5/");
        assert_eq!(MaterializedPath::root(12).to_string(), "12/");
    }

    #[test]
    fn test_decode() {
        let path = MaterializedPath::decode("3/4/5/").unwrap();
        assert_eq!(path.ids(), &[3, 4, 5]);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(MaterializedPath::decode("3/4").is_err());
        assert!(MaterializedPath::decode("3/x/").is_err());
        assert!(MaterializedPath::decode("").is_err());
    }

    #[test]
    fn test_descendant_range_bounds() {
        let (lower, upper) = MaterializedPath::from(vec![3, 4]).descendant_range();
        assert_eq!(lower, "3/4/");
        assert_eq!(upper, "3/40");

        let inside = "3/4/5/7/";
        assert!(inside > lower.as_str() && inside < upper.as_str());

        // Sibling ids sharing a digit prefix sort outside the range.
        for outside in ["3/4/", "3/40/", "3/41/", "3/5/", "34/"] {
            assert!(
                !(outside > lower.as_str() && outside < upper.as_str()),
                "{outside} should be outside"
            );
        }
    }

    #[test]
    fn test_node_indexed_path() {
        let node = Node {
            id: 9,
            parent_id: None,
            path: None,
            terminal: false,
        };
        assert!(matches!(
            node.indexed_path(),
            Err(VocabError::IndexNotBuilt(9))
        ));
        assert_eq!(node.depth(), None);
        assert!(node.is_root());
    }
}
