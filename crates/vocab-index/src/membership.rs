//! Set-membership evaluation over the holder↔item association.
//!
//! Each operator reduces to at most three grouped aggregates against the
//! [`AssociationStore`]:
//!
//! ```text
//! matched(h) = COUNT(DISTINCT item_id) WHERE item_id IN values GROUP BY holder_id
//! total(h)   = COUNT(DISTINCT item_id) WHERE holder_id IN ...  GROUP BY holder_id
//! universe   = every holder, with or without associations
//!
//! requires_any = { h | matched(h) >= 1 }
//! requires_all = { h | matched(h) == |values| }
//! excludes_all = universe - requires_any
//! excludes_any = universe - requires_all
//! only         = { h ∈ requires_all | total(h) == |values| }
//! ```
//!
//! Counting distinct items keeps `requires_all` correct even when the store
//! holds duplicate `(holder, item)` rows. The complements range over the
//! whole holder universe, so a holder without any association satisfies
//! both `excludes_*` operators for every non-empty value set.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use tracing::{debug, instrument};

use crate::error::{VocabError, VocabResult};
use crate::operator::Operator;
use crate::result::{EvaluationStats, MembershipResult};
use crate::traits::AssociationStore;
use crate::types::{HolderId, ItemId};

/// Evaluates membership operators against an association store.
///
/// Evaluation is read-only and uncached: every call reflects the store at
/// the time of the call, under whatever isolation the store provides.
///
/// # Example
///
/// ```rust
/// use vocab_index::{MembershipEvaluator, MemoryStore, Operator};
///
/// let mut store = MemoryStore::new();
/// store.assign(1, 1);
/// store.assign(1, 3);
/// store.assign(2, 3);
///
/// let evaluator = MembershipEvaluator::new(&store);
/// let result = evaluator.evaluate(Operator::RequiresAll, &[1, 3]).unwrap();
/// assert_eq!(result.to_vec(), vec![1]);
/// ```
pub struct MembershipEvaluator<'a> {
    store: &'a dyn AssociationStore,
}

impl<'a> MembershipEvaluator<'a> {
    /// Creates an evaluator over the given store.
    pub fn new(store: &'a dyn AssociationStore) -> Self {
        Self { store }
    }

    /// Evaluates an operator given by name (`"in"`, `"-all"`, `"only"`, ...).
    pub fn evaluate_named(
        &self,
        operator: &str,
        values: &[ItemId],
    ) -> VocabResult<MembershipResult> {
        self.evaluate(Operator::parse(operator)?, values)
    }

    /// Returns the holders satisfying `operator` for `values`.
    ///
    /// `values` is treated as a set; duplicates are ignored. Fails with
    /// [`VocabError::EmptyValueSet`] if it is empty.
    #[instrument(level = "debug", skip(self, values), fields(values = values.len()))]
    pub fn evaluate(
        &self,
        operator: Operator,
        values: &[ItemId],
    ) -> VocabResult<MembershipResult> {
        let start = Instant::now();

        let values: Vec<ItemId> = values
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if values.is_empty() {
            return Err(VocabError::EmptyValueSet);
        }

        let mut stats = EvaluationStats {
            value_count: values.len(),
            ..EvaluationStats::default()
        };

        let holder_ids = match operator {
            Operator::RequiresAny => self.requires_any(&values, &mut stats)?,
            Operator::RequiresAll => self.requires_all(&values, &mut stats)?,
            Operator::ExcludesAny => {
                let matched = self.requires_all(&values, &mut stats)?;
                self.complement(&matched, &mut stats)?
            }
            Operator::ExcludesAll => {
                let matched = self.requires_any(&values, &mut stats)?;
                self.complement(&matched, &mut stats)?
            }
            Operator::Only => self.only(&values, &mut stats)?,
        };

        stats.duration = start.elapsed();
        debug!(
            operator = %operator,
            matched = holder_ids.len(),
            elapsed_us = stats.duration.as_micros() as u64,
            "membership evaluated"
        );

        Ok(MembershipResult::new(holder_ids, stats))
    }

    fn requires_any(
        &self,
        values: &[ItemId],
        stats: &mut EvaluationStats,
    ) -> VocabResult<HashSet<HolderId>> {
        let counts = self.store.distinct_item_counts(values)?;
        stats.holders_aggregated = counts.len();
        Ok(counts
            .into_iter()
            .filter(|&(_, matched)| matched >= 1)
            .map(|(holder, _)| holder)
            .collect())
    }

    fn requires_all(
        &self,
        values: &[ItemId],
        stats: &mut EvaluationStats,
    ) -> VocabResult<HashSet<HolderId>> {
        let counts = self.store.distinct_item_counts(values)?;
        stats.holders_aggregated = counts.len();
        Ok(counts
            .into_iter()
            .filter(|&(_, matched)| matched == values.len())
            .map(|(holder, _)| holder)
            .collect())
    }

    fn only(
        &self,
        values: &[ItemId],
        stats: &mut EvaluationStats,
    ) -> VocabResult<HashSet<HolderId>> {
        let candidates: Vec<HolderId> = self.requires_all(values, stats)?.into_iter().collect();
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }

        let totals = self.store.assignment_counts(&candidates)?;
        Ok(candidates
            .into_iter()
            .filter(|holder| totals.get(holder).copied() == Some(values.len()))
            .collect())
    }

    fn complement(
        &self,
        matched: &HashSet<HolderId>,
        stats: &mut EvaluationStats,
    ) -> VocabResult<HashSet<HolderId>> {
        let universe = self.store.holder_ids()?;
        stats.universe_size = Some(universe.len());
        Ok(universe
            .into_iter()
            .filter(|holder| !matched.contains(holder))
            .collect())
    }
}

impl std::fmt::Debug for MembershipEvaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipEvaluator").finish_non_exhaustive()
    }
}
