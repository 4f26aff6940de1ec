//! Error types for index maintenance and queries.

use thiserror::Error;

use crate::types::NodeId;

/// Errors raised by the index builder, hierarchy queries and the
/// membership evaluator.
///
/// None of these are transient: each one means either caller misuse or a
/// corrupted store, and nothing is retried internally.
#[derive(Error, Debug)]
pub enum VocabError {
    /// Following parent links from `node` never reached a root.
    #[error("Cycle detected in parent links at node {node}")]
    CycleDetected {
        /// A node on (or leading into) the cycle.
        node: NodeId,
    },

    /// A parent link references a node that does not exist.
    #[error("Node {node} references unknown parent {parent}")]
    UnknownParent {
        /// The node holding the dangling link.
        node: NodeId,
        /// The missing parent id.
        parent: NodeId,
    },

    /// Node not found in the store.
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    /// Node exists but has not been indexed by a rebuild yet.
    #[error("Node {0} has no path; rebuild the index first")]
    IndexNotBuilt(NodeId),

    /// Operator name not recognised.
    #[error("Invalid operator: {0:?}")]
    InvalidOperator(String),

    /// Membership evaluation called without any item ids.
    #[error("Empty value set: at least one item id is required")]
    EmptyValueSet,

    /// Result set exceeds configured limit.
    #[error("Result set too large: {count} exceeds limit {limit}")]
    ResultTooLarge {
        /// Number of results found.
        count: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Error from the underlying store.
    #[error("Store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl VocabError {
    /// Wraps a backend error.
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Store(err.into())
    }
}

/// Result type for index and query operations.
pub type VocabResult<T> = std::result::Result<T, VocabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_cycle_detected() {
        let err = VocabError::CycleDetected { node: 7 };
        assert_eq!(err.to_string(), "Cycle detected in parent links at node 7");
    }

    #[test]
    fn test_error_display_unknown_parent() {
        let err = VocabError::UnknownParent { node: 4, parent: 99 };
        assert_eq!(err.to_string(), "Node 4 references unknown parent 99");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = VocabError::NotFound(42);
        assert_eq!(err.to_string(), "Node not found: 42");
    }

    #[test]
    fn test_error_display_invalid_operator() {
        let err = VocabError::InvalidOperator("some".to_string());
        assert_eq!(err.to_string(), "Invalid operator: \"some\"");
    }

    #[test]
    fn test_error_display_result_too_large() {
        let err = VocabError::ResultTooLarge {
            count: 150,
            limit: 100,
        };
        assert_eq!(err.to_string(), "Result set too large: 150 exceeds limit 100");
    }

    #[test]
    fn test_store_error_from_string() {
        let err = VocabError::store("disk on fire");
        assert_eq!(err.to_string(), "Store error: disk on fire");
        assert!(std::error::Error::source(&err).is_some());
    }
}
