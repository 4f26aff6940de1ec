//! Result types for membership evaluation and index rebuilds.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use crate::types::HolderId;

/// Holders satisfying a membership predicate.
///
/// The set has no duplicates and no meaningful order; use
/// [`to_vec`](Self::to_vec) for a sorted list.
///
/// # Example
///
/// ```ignore
/// let result = evaluator.evaluate(Operator::RequiresAll, &[1, 3])?;
///
/// println!("{} holders have both items", result.count());
/// assert_eq!(result.to_vec(), vec![1, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct MembershipResult {
    /// Matching holder IDs.
    pub holder_ids: HashSet<HolderId>,
    /// Evaluation statistics.
    pub stats: EvaluationStats,
}

impl MembershipResult {
    /// Creates a new MembershipResult with the given holder IDs.
    pub fn new(holder_ids: HashSet<HolderId>, stats: EvaluationStats) -> Self {
        Self { holder_ids, stats }
    }

    /// Returns the number of matching holders.
    pub fn count(&self) -> usize {
        self.holder_ids.len()
    }

    /// Returns true if no holder matched.
    pub fn is_empty(&self) -> bool {
        self.holder_ids.is_empty()
    }

    /// Checks if a specific holder is in the result set.
    pub fn contains(&self, holder_id: HolderId) -> bool {
        self.holder_ids.contains(&holder_id)
    }

    /// Returns an iterator over matching holder IDs.
    pub fn iter(&self) -> impl Iterator<Item = &HolderId> {
        self.holder_ids.iter()
    }

    /// Converts the result set to a sorted Vec.
    pub fn to_vec(&self) -> Vec<HolderId> {
        let mut vec: Vec<HolderId> = self.holder_ids.iter().copied().collect();
        vec.sort_unstable();
        vec
    }
}

impl IntoIterator for MembershipResult {
    type Item = HolderId;
    type IntoIter = std::collections::hash_set::IntoIter<HolderId>;

    fn into_iter(self) -> Self::IntoIter {
        self.holder_ids.into_iter()
    }
}

impl<'a> IntoIterator for &'a MembershipResult {
    type Item = &'a HolderId;
    type IntoIter = std::collections::hash_set::Iter<'a, HolderId>;

    fn into_iter(self) -> Self::IntoIter {
        self.holder_ids.iter()
    }
}

/// Statistics from a membership evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluationStats {
    /// Total evaluation duration.
    pub duration: Duration,
    /// Number of distinct item ids evaluated against.
    pub value_count: usize,
    /// Number of holders returned by the grouped aggregate.
    pub holders_aggregated: usize,
    /// Size of the holder universe, when the operator needed it.
    pub universe_size: Option<usize>,
}

/// Summary of a committed index rebuild.
#[derive(Debug, Clone, Default)]
pub struct RebuildReport {
    /// Number of nodes indexed.
    pub node_count: usize,
    /// Number of nodes without a parent.
    pub root_count: usize,
    /// Number of nodes without children.
    pub terminal_count: usize,
    /// Greatest depth seen (roots are depth 0).
    pub max_depth: usize,
    /// Index generation published by the commit.
    pub generation: u64,
    /// Time taken, including the store writes.
    pub duration: Duration,
}

impl fmt::Display for RebuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path Index Rebuild:")?;
        writeln!(f, "  Nodes:       {}", self.node_count)?;
        writeln!(f, "  Roots:       {}", self.root_count)?;
        writeln!(f, "  Terminals:   {}", self.terminal_count)?;
        writeln!(f, "  Max depth:   {}", self.max_depth)?;
        writeln!(f, "  Generation:  {}", self.generation)?;
        writeln!(f, "  Build time:  {}ms", self.duration.as_millis())?;
        Ok(())
    }
}
