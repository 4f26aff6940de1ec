//! Small helpers shared by the SQLite store and its rebuild writer.

use rusqlite::types::Type;
use rusqlite::Row;
use vocab_index::{MaterializedPath, Node, VocabError, VocabResult};

/// Upper bound on bound parameters per statement. SQLite builds before
/// 3.32 default to 999.
pub(crate) const MAX_PARAMS: usize = 900;

/// Column list matching [`NodeRow::from_row`].
pub(crate) const NODE_COLUMNS: &str = "id, parent_id, path, terminal";

pub(crate) trait SqlResultExt<T> {
    fn store_err(self) -> VocabResult<T>;
}

impl<T> SqlResultExt<T> for rusqlite::Result<T> {
    fn store_err(self) -> VocabResult<T> {
        self.map_err(VocabError::store)
    }
}

/// Converts an id for binding as an SQLite INTEGER.
pub(crate) fn to_sql_id(id: u64) -> VocabResult<i64> {
    i64::try_from(id)
        .map_err(|_| VocabError::store(format!("id {id} exceeds the SQLite INTEGER range")))
}

pub(crate) fn to_sql_ids(ids: &[u64]) -> VocabResult<Vec<i64>> {
    ids.iter().map(|&id| to_sql_id(id)).collect()
}

/// Reads a non-negative INTEGER column as an id.
pub(crate) fn from_sql_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err)))
}

/// `?,?,?` with `n` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    let mut out = String::with_capacity(n * 2);
    for i in 0..n {
        if i > 0 {
            out.push(',');
        }
        out.push('?');
    }
    out
}

/// A `nodes` row before its path is decoded.
pub(crate) struct NodeRow {
    id: u64,
    parent_id: Option<u64>,
    path: Option<String>,
    terminal: bool,
}

impl NodeRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let parent_id = match row.get::<_, Option<i64>>(1)? {
            Some(_) => Some(from_sql_id(row, 1)?),
            None => None,
        };
        Ok(Self {
            id: from_sql_id(row, 0)?,
            parent_id,
            path: row.get(2)?,
            terminal: row.get(3)?,
        })
    }

    pub(crate) fn into_node(self) -> VocabResult<Node> {
        let path = self
            .path
            .as_deref()
            .map(MaterializedPath::decode)
            .transpose()?;
        Ok(Node {
            id: self.id,
            parent_id: self.parent_id,
            path,
            terminal: self.terminal,
        })
    }
}
