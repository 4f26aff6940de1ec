//! Materialized-path index maintenance.
//!
//! Parent links are the source of truth; paths and terminal flags are a
//! derived cache recomputed in full by [`PathIndexBuilder::rebuild`].
//! There is no incremental maintenance: after the tree shape changes,
//! hierarchy queries keep answering from the previous generation until the
//! next rebuild commits.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::error::{VocabError, VocabResult};
use crate::result::RebuildReport;
use crate::traits::NodeStore;
use crate::types::{IndexEntry, MaterializedPath, NodeId, ParentLink};

/// Recomputes every node's path and terminal flag.
///
/// # Example
///
/// ```rust
/// use vocab_index::{MemoryStore, PathIndexBuilder};
///
/// let mut store = MemoryStore::new();
/// store.add_node(1, None);
/// store.add_node(2, Some(1));
///
/// let report = PathIndexBuilder::rebuild(&mut store).unwrap();
/// assert_eq!(report.node_count, 2);
/// assert_eq!(report.terminal_count, 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PathIndexBuilder;

impl PathIndexBuilder {
    /// Rebuilds the whole index inside one store transaction.
    ///
    /// Either every node receives a freshly computed path, or, on
    /// [`VocabError::CycleDetected`], [`VocabError::UnknownParent`] or a
    /// store failure, the transaction is dropped and nothing is written.
    #[instrument(level = "debug", skip(store))]
    pub fn rebuild<S>(store: &mut S) -> VocabResult<RebuildReport>
    where
        S: NodeStore + ?Sized,
    {
        let start = Instant::now();
        let mut writer = store.begin_rebuild()?;
        let links = writer.parent_links()?;
        debug!(nodes = links.len(), "read parent links");

        let entries = match Self::compute_entries(&links) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "path index rebuild aborted");
                return Err(err);
            }
        };

        writer.write_entries(&entries)?;
        let generation = writer.commit()?;

        let report = RebuildReport {
            node_count: entries.len(),
            root_count: links.iter().filter(|l| l.parent_id.is_none()).count(),
            terminal_count: entries.iter().filter(|e| e.terminal).count(),
            max_depth: entries.iter().map(|e| e.path.depth()).max().unwrap_or(0),
            generation,
            duration: start.elapsed(),
        };

        info!(
            nodes = report.node_count,
            terminals = report.terminal_count,
            max_depth = report.max_depth,
            generation,
            elapsed_ms = report.duration.as_millis() as u64,
            "path index rebuilt"
        );

        Ok(report)
    }

    /// Computes index entries from parent links without touching a store.
    ///
    /// Entries come back sorted by node id. Each node is resolved once: the
    /// walk from a node stops at the first ancestor whose path is already
    /// known, so the total work is linear in the number of nodes.
    pub fn compute_entries(links: &[ParentLink]) -> VocabResult<Vec<IndexEntry>> {
        let parents: HashMap<NodeId, Option<NodeId>> =
            links.iter().map(|link| (link.id, link.parent_id)).collect();

        let mut ordered: Vec<&ParentLink> = links.iter().collect();
        ordered.sort_by_key(|link| link.id);

        for link in &ordered {
            if let Some(parent) = link.parent_id {
                if !parents.contains_key(&parent) {
                    return Err(VocabError::UnknownParent {
                        node: link.id,
                        parent,
                    });
                }
            }
        }

        let limit = parents.len();
        let mut paths: HashMap<NodeId, MaterializedPath> = HashMap::with_capacity(limit);

        for link in &ordered {
            if paths.contains_key(&link.id) {
                continue;
            }

            // Unresolved nodes from `link.id` upwards.
            let mut chain = vec![link.id];
            let mut current = link.id;
            let mut base: Option<MaterializedPath> = None;

            loop {
                match parents.get(&current).copied() {
                    Some(None) => break,
                    Some(Some(parent)) => {
                        if let Some(resolved) = paths.get(&parent) {
                            base = Some(resolved.clone());
                            break;
                        }
                        if chain.len() >= limit {
                            return Err(VocabError::CycleDetected { node: link.id });
                        }
                        chain.push(parent);
                        current = parent;
                    }
                    None => return Err(VocabError::NotFound(current)),
                }
            }

            for id in chain.into_iter().rev() {
                let path = match &base {
                    Some(parent_path) => parent_path.child(id),
                    None => MaterializedPath::root(id),
                };
                paths.insert(id, path.clone());
                base = Some(path);
            }
        }

        let has_children: HashSet<NodeId> = links.iter().filter_map(|l| l.parent_id).collect();

        ordered
            .into_iter()
            .map(|link| {
                let path = paths
                    .remove(&link.id)
                    .ok_or(VocabError::NotFound(link.id))?;
                Ok(IndexEntry {
                    id: link.id,
                    path,
                    terminal: !has_children.contains(&link.id),
                })
            })
            .collect()
    }
}
