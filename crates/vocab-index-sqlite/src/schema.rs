//! Schema for the node, holder and assignment tables.
//!
//! `nodes.path` holds [`MaterializedPath::encode`](vocab_index::MaterializedPath::encode)
//! output; the index on it serves descendant range scans. The
//! `assignments` indexes cover both aggregate directions: by item for the
//! matched-count query, by holder for the total-count query.

use rusqlite::{params, Connection};

pub(crate) const GENERATION_KEY: &str = "index_generation";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
  key TEXT PRIMARY KEY,
  value INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS nodes (
  id INTEGER PRIMARY KEY,
  parent_id INTEGER,
  path TEXT,
  depth INTEGER,
  terminal INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS nodes_parent_idx ON nodes(parent_id);
CREATE INDEX IF NOT EXISTS nodes_path_idx ON nodes(path);

CREATE TABLE IF NOT EXISTS holders (
  id INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS assignments (
  holder_id INTEGER NOT NULL REFERENCES holders(id) ON DELETE CASCADE,
  item_id INTEGER NOT NULL,
  PRIMARY KEY (holder_id, item_id)
);
CREATE INDEX IF NOT EXISTS assignments_item_idx ON assignments(item_id, holder_id);
"#;

pub(crate) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params![GENERATION_KEY, 0i64],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let generation: i64 = conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![GENERATION_KEY],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(generation, 0);
    }
}
