//! Rebuild transaction over the `nodes` table.

use rusqlite::{params, Transaction};
use tracing::debug;
use vocab_index::{IndexEntry, IndexWriter, ParentLink, VocabError, VocabResult};

use crate::schema::GENERATION_KEY;
use crate::sql::{from_sql_id, to_sql_id, SqlResultExt};

/// An `IMMEDIATE` transaction held for the duration of a rebuild.
///
/// The write lock is taken when the transaction opens, so the parent links
/// read here are the ones the new paths are written over. Dropping the
/// writer rolls everything back.
pub(crate) struct SqliteRebuild<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> SqliteRebuild<'conn> {
    pub(crate) fn new(tx: Transaction<'conn>) -> Self {
        Self { tx }
    }
}

impl IndexWriter for SqliteRebuild<'_> {
    fn parent_links(&self) -> VocabResult<Vec<ParentLink>> {
        let mut stmt = self
            .tx
            .prepare("SELECT id, parent_id FROM nodes ORDER BY id")
            .store_err()?;
        let links = stmt
            .query_map([], |row| {
                let parent_id = match row.get::<_, Option<i64>>(1)? {
                    Some(_) => Some(from_sql_id(row, 1)?),
                    None => None,
                };
                Ok(ParentLink::new(from_sql_id(row, 0)?, parent_id))
            })
            .store_err()?
            .collect::<rusqlite::Result<Vec<_>>>()
            .store_err()?;
        Ok(links)
    }

    fn write_entries(&mut self, entries: &[IndexEntry]) -> VocabResult<()> {
        let mut stmt = self
            .tx
            .prepare_cached("UPDATE nodes SET path = ?2, depth = ?3, terminal = ?4 WHERE id = ?1")
            .store_err()?;

        for entry in entries {
            let depth = i64::try_from(entry.path.depth()).map_err(VocabError::store)?;
            let changed = stmt
                .execute(params![
                    to_sql_id(entry.id)?,
                    entry.path.encode(),
                    depth,
                    entry.terminal
                ])
                .store_err()?;
            if changed == 0 {
                return Err(VocabError::NotFound(entry.id));
            }
        }

        debug!(rows = entries.len(), "staged index entries");
        Ok(())
    }

    fn commit(self: Box<Self>) -> VocabResult<u64> {
        let SqliteRebuild { tx } = *self;
        tx.execute(
            "UPDATE meta SET value = value + 1 WHERE key = ?1",
            params![GENERATION_KEY],
        )
        .store_err()?;
        let generation: i64 = tx
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![GENERATION_KEY],
                |row| row.get(0),
            )
            .store_err()?;
        tx.commit().store_err()?;

        u64::try_from(generation).map_err(VocabError::store)
    }
}
