//! SQLite implementation of the node and association store contracts.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, instrument};
use vocab_index::{
    AssociationStore, HolderId, IndexWriter, ItemId, MaterializedPath, Node, NodeId, NodeStore,
    VocabError, VocabResult,
};

use crate::rebuild::SqliteRebuild;
use crate::schema::{migrate, GENERATION_KEY};
use crate::sql::{
    from_sql_id, placeholders, to_sql_id, to_sql_ids, NodeRow, SqlResultExt, MAX_PARAMS,
    NODE_COLUMNS,
};

/// How long a statement waits on another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Node and association store backed by a single SQLite connection.
///
/// Every query the engine issues is one statement: descendant lookups are
/// a range scan on the encoded `path` column, membership aggregates are
/// `GROUP BY holder_id` with `COUNT(DISTINCT item_id)`.
///
/// # Example
///
/// ```rust
/// use vocab_index::{MembershipEvaluator, Operator, PathIndexBuilder};
/// use vocab_index_sqlite::SqliteStore;
///
/// let mut store = SqliteStore::open_in_memory().unwrap();
/// store.add_node(1, None).unwrap();
/// store.add_node(2, Some(1)).unwrap();
/// store.assign(10, 2).unwrap();
/// PathIndexBuilder::rebuild(&mut store).unwrap();
///
/// let evaluator = MembershipEvaluator::new(&store);
/// let holders = evaluator.evaluate(Operator::RequiresAny, &[2]).unwrap();
/// assert_eq!(holders.to_vec(), vec![10]);
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (creating if needed) a database file and migrates its schema.
    pub fn open(path: impl AsRef<Path>) -> VocabResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).store_err()?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .store_err()?;
        Self::init(conn, Some(path))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> VocabResult<Self> {
        let conn = Connection::open_in_memory().store_err()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> VocabResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).store_err()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").store_err()?;
        migrate(&conn).store_err()?;
        debug!(path = ?path, "sqlite store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Inserts a node, or replaces its parent link if it exists.
    ///
    /// Derived fields are left untouched until the next rebuild.
    pub fn add_node(&self, id: NodeId, parent_id: Option<NodeId>) -> VocabResult<()> {
        let parent_id = parent_id.map(to_sql_id).transpose()?;
        self.conn
            .lock()
            .execute(
                "INSERT INTO nodes(id, parent_id) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET parent_id = excluded.parent_id",
                params![to_sql_id(id)?, parent_id],
            )
            .store_err()?;
        Ok(())
    }

    /// Changes the parent of an existing node.
    pub fn set_parent(&self, id: NodeId, parent_id: Option<NodeId>) -> VocabResult<()> {
        let parent_id = parent_id.map(to_sql_id).transpose()?;
        let changed = self
            .conn
            .lock()
            .execute(
                "UPDATE nodes SET parent_id = ?2 WHERE id = ?1",
                params![to_sql_id(id)?, parent_id],
            )
            .store_err()?;
        if changed == 0 {
            return Err(VocabError::NotFound(id));
        }
        Ok(())
    }

    /// Registers a holder, with or without associations.
    pub fn add_holder(&self, holder_id: HolderId) -> VocabResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT OR IGNORE INTO holders(id) VALUES (?1)",
                params![to_sql_id(holder_id)?],
            )
            .store_err()?;
        Ok(())
    }

    /// Assigns `item_id` to `holder_id`, registering the holder if needed.
    pub fn assign(&self, holder_id: HolderId, item_id: ItemId) -> VocabResult<()> {
        let holder = to_sql_id(holder_id)?;
        let item = to_sql_id(item_id)?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction().store_err()?;
        tx.execute("INSERT OR IGNORE INTO holders(id) VALUES (?1)", params![holder])
            .store_err()?;
        tx.execute(
            "INSERT OR IGNORE INTO assignments(holder_id, item_id) VALUES (?1, ?2)",
            params![holder, item],
        )
        .store_err()?;
        tx.commit().store_err()
    }

    /// Removes an assignment. The holder stays registered.
    pub fn unassign(&self, holder_id: HolderId, item_id: ItemId) -> VocabResult<()> {
        self.conn
            .lock()
            .execute(
                "DELETE FROM assignments WHERE holder_id = ?1 AND item_id = ?2",
                params![to_sql_id(holder_id)?, to_sql_id(item_id)?],
            )
            .store_err()?;
        Ok(())
    }

    fn query_nodes<P>(&self, sql: &str, params: P) -> VocabResult<Vec<Node>>
    where
        P: rusqlite::Params,
    {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql).store_err()?;
        let rows = stmt
            .query_map(params, NodeRow::from_row)
            .store_err()?
            .collect::<rusqlite::Result<Vec<_>>>()
            .store_err()?;
        rows.into_iter().map(NodeRow::into_node).collect()
    }

    /// Runs a two-column `(holder_id, count)` aggregate once per chunk of
    /// `ids` and sums the counts per holder.
    fn grouped_counts(
        &self,
        sql_for: impl Fn(&str) -> String,
        ids: &[u64],
    ) -> VocabResult<HashMap<HolderId, usize>> {
        let ids = to_sql_ids(ids)?;
        let conn = self.conn.lock();
        let mut counts: HashMap<HolderId, usize> = HashMap::new();

        for chunk in ids.chunks(MAX_PARAMS) {
            let sql = sql_for(&placeholders(chunk.len()));
            let mut stmt = conn.prepare_cached(&sql).store_err()?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    Ok((from_sql_id(row, 0)?, row.get::<_, i64>(1)?))
                })
                .store_err()?;
            for row in rows {
                let (holder, count) = row.store_err()?;
                let count = usize::try_from(count).map_err(VocabError::store)?;
                *counts.entry(holder).or_default() += count;
            }
        }

        Ok(counts)
    }
}

impl NodeStore for SqliteStore {
    fn begin_rebuild(&mut self) -> VocabResult<Box<dyn IndexWriter + '_>> {
        let tx = self
            .conn
            .get_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .store_err()?;
        Ok(Box::new(SqliteRebuild::new(tx)))
    }

    fn node(&self, id: NodeId) -> VocabResult<Option<Node>> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1");
        let conn = self.conn.lock();
        let row = conn
            .query_row(&sql, params![to_sql_id(id)?], NodeRow::from_row)
            .optional()
            .store_err()?;
        row.map(NodeRow::into_node).transpose()
    }

    fn nodes(&self, ids: &[NodeId]) -> VocabResult<Vec<Node>> {
        let ids = to_sql_ids(ids)?;
        let mut nodes = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_PARAMS) {
            let sql = format!(
                "SELECT {NODE_COLUMNS} FROM nodes WHERE id IN ({})",
                placeholders(chunk.len())
            );
            nodes.extend(self.query_nodes(&sql, params_from_iter(chunk.iter()))?);
        }
        Ok(nodes)
    }

    #[instrument(level = "debug", skip(self, path), fields(path = %path))]
    fn nodes_below(&self, path: &MaterializedPath) -> VocabResult<Vec<Node>> {
        let (lower, upper) = path.descendant_range();
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE path > ?1 AND path < ?2");
        self.query_nodes(&sql, params![lower, upper])
    }

    #[instrument(level = "debug", skip(self, path), fields(path = %path))]
    fn child_nodes(&self, path: &MaterializedPath) -> VocabResult<Vec<Node>> {
        let (lower, upper) = path.descendant_range();
        let depth = i64::try_from(path.depth() + 1).map_err(VocabError::store)?;
        let sql = format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE path > ?1 AND path < ?2 AND depth = ?3"
        );
        self.query_nodes(&sql, params![lower, upper, depth])
    }

    fn roots(&self) -> VocabResult<Vec<Node>> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id IS NULL ORDER BY id");
        self.query_nodes(&sql, [])
    }

    fn index_generation(&self) -> VocabResult<u64> {
        let generation: i64 = self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![GENERATION_KEY],
                |row| row.get(0),
            )
            .store_err()?;
        u64::try_from(generation).map_err(VocabError::store)
    }
}

impl AssociationStore for SqliteStore {
    fn holder_ids(&self) -> VocabResult<HashSet<HolderId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT id FROM holders").store_err()?;
        let ids = stmt
            .query_map([], |row| from_sql_id(row, 0))
            .store_err()?
            .collect::<rusqlite::Result<HashSet<_>>>()
            .store_err()?;
        Ok(ids)
    }

    #[instrument(level = "debug", skip(self, items), fields(items = items.len()))]
    fn distinct_item_counts(&self, items: &[ItemId]) -> VocabResult<HashMap<HolderId, usize>> {
        // Chunks partition the item set, so per-chunk distinct counts add up.
        self.grouped_counts(
            |list| {
                format!(
                    "SELECT holder_id, COUNT(DISTINCT item_id) FROM assignments \
                     WHERE item_id IN ({list}) GROUP BY holder_id"
                )
            },
            items,
        )
    }

    #[instrument(level = "debug", skip(self, holders), fields(holders = holders.len()))]
    fn assignment_counts(&self, holders: &[HolderId]) -> VocabResult<HashMap<HolderId, usize>> {
        self.grouped_counts(
            |list| {
                format!(
                    "SELECT holder_id, COUNT(DISTINCT item_id) FROM assignments \
                     WHERE holder_id IN ({list}) GROUP BY holder_id"
                )
            },
            holders,
        )
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
