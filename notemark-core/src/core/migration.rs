//! Ordered, additive schema migrations for the note store.
//!
//! Each migration step brings the schema from version `n - 1` to `n` and is
//! written as "create if absent", so replaying a partially applied chain is
//! harmless. The whole chain runs inside the caller's upgrade transaction:
//! if any step fails the transaction is dropped and nothing is committed.

use crate::{Collection, NotemarkError, Result};
use rusqlite::Connection;
use std::collections::BTreeMap;

/// The schema version this build creates and understands.
pub const SCHEMA_VERSION: u32 = 2;

/// Name of the note creation-time index.
pub const CREATE_AT_INDEX: &str = "createAt";

/// A migration step.
pub type MigrationStep = fn(&SchemaEdit<'_>) -> rusqlite::Result<()>;

/// Schema-editing handle given to migration steps.
///
/// Collections are tables holding one JSON document per key; an index is an
/// expression index over one JSON key path of that document.
pub struct SchemaEdit<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaEdit<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create_collection(&self, collection: Collection) -> rusqlite::Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            collection.name()
        ))
    }

    pub fn has_collection(&self, collection: Collection) -> rusqlite::Result<bool> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [collection.name()],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )
    }

    /// Creates a non-unique ascending index over `key_path` unless it exists.
    pub fn create_index(&self, collection: Collection, index: &str, key_path: &str) -> rusqlite::Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS {name} ON {table} (json_extract(value, '$.{key_path}'))",
            name = index_table_name(collection, index),
            table = collection.name(),
        ))
    }

    pub fn has_index(&self, collection: Collection, index: &str) -> rusqlite::Result<bool> {
        Ok(self.index_names(collection)?.contains(&index_table_name(collection, index)))
    }

    /// Names of the explicitly created indexes on `collection`.
    pub fn index_names(&self, collection: Collection) -> rusqlite::Result<Vec<String>> {
        index_names(self.conn, collection)
    }
}

/// SQLite name of index `index` on `collection`.
pub fn index_table_name(collection: Collection, index: &str) -> String {
    format!("{}_{}", collection.name(), index)
}

/// Names of the explicitly created indexes on `collection`.
pub fn index_names(conn: &Connection, collection: Collection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([collection.name()], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// Reads the schema version stored in the database header.
pub fn stored_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Migration steps keyed by the version they produce.
pub struct MigrationRegistry {
    steps: BTreeMap<u32, MigrationStep>,
}

impl MigrationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    /// The registry for the current note store schema.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(1, create_initial_collections);
        registry.register(2, ensure_create_at_index);
        registry
    }

    /// Registers the step that produces `version`, replacing any earlier one.
    pub fn register(&mut self, version: u32, step: MigrationStep) {
        self.steps.insert(version, step);
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Runs every registered step for versions `from + 1 ..= to`, in order,
    /// then records `to` as the stored version. Does nothing when `from >= to`.
    ///
    /// Versions without a registered step are skipped. Returns the versions
    /// whose step ran.
    ///
    /// # Errors
    ///
    /// Returns [`NotemarkError::Migration`] naming the version whose step (or
    /// the final version bump) failed. The caller must drop, not commit, the
    /// transaction in that case.
    pub fn apply(&self, conn: &Connection, from: u32, to: u32) -> Result<Vec<u32>> {
        if from >= to {
            return Ok(Vec::new());
        }
        let edit = SchemaEdit::new(conn);
        let mut applied = Vec::new();

        for (&version, step) in self.steps.range(from + 1..=to) {
            log::info!("upgrading note store to version {version}");
            step(&edit).map_err(|source| NotemarkError::Migration { version, source })?;
            applied.push(version);
        }

        conn.pragma_update(None, "user_version", to)
            .map_err(|source| NotemarkError::Migration { version: to, source })?;
        Ok(applied)
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn create_initial_collections(edit: &SchemaEdit<'_>) -> rusqlite::Result<()> {
    edit.create_collection(Collection::Files)?;
    edit.create_collection(Collection::Notes)?;
    edit.create_index(Collection::Notes, CREATE_AT_INDEX, "createAt")
}

fn ensure_create_at_index(edit: &SchemaEdit<'_>) -> rusqlite::Result<()> {
    if !edit.has_index(Collection::Notes, CREATE_AT_INDEX)? {
        edit.create_index(Collection::Notes, CREATE_AT_INDEX, "createAt")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_step(edit: &SchemaEdit<'_>) -> rusqlite::Result<()> {
        edit.conn.execute_batch("CREATE TABLE broken (")
    }

    fn marker_table_step(edit: &SchemaEdit<'_>) -> rusqlite::Result<()> {
        edit.conn.execute_batch("CREATE TABLE IF NOT EXISTS step_three (id TEXT)")
    }

    #[test]
    fn test_fresh_store_runs_both_steps_in_order() {
        let mut conn = Connection::open_in_memory().unwrap();
        let tx = conn.transaction().unwrap();
        let applied = MigrationRegistry::standard().apply(&tx, 0, SCHEMA_VERSION).unwrap();
        tx.commit().unwrap();

        assert_eq!(applied, vec![1, 2]);
        assert_eq!(stored_version(&conn).unwrap(), 2);

        let edit = SchemaEdit::new(&conn);
        assert!(edit.has_collection(Collection::Files).unwrap());
        assert!(edit.has_collection(Collection::Notes).unwrap());
        assert_eq!(index_names(&conn, Collection::Notes).unwrap(), vec!["notes_createAt".to_string()]);
        assert!(index_names(&conn, Collection::Files).unwrap().is_empty());
    }

    #[test]
    fn test_rerunning_at_current_version_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = MigrationRegistry::standard();
        registry.apply(&conn, 0, SCHEMA_VERSION).unwrap();

        let applied = registry.apply(&conn, SCHEMA_VERSION, SCHEMA_VERSION).unwrap();
        assert!(applied.is_empty());
        assert_eq!(index_names(&conn, Collection::Notes).unwrap().len(), 1);
    }

    #[test]
    fn test_replaying_whole_chain_keeps_single_index() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = MigrationRegistry::standard();
        registry.apply(&conn, 0, SCHEMA_VERSION).unwrap();
        registry.apply(&conn, 0, SCHEMA_VERSION).unwrap();
        assert_eq!(index_names(&conn, Collection::Notes).unwrap().len(), 1);
    }

    #[test]
    fn test_version_one_store_without_index_gains_it() {
        let conn = Connection::open_in_memory().unwrap();
        let edit = SchemaEdit::new(&conn);
        edit.create_collection(Collection::Files).unwrap();
        edit.create_collection(Collection::Notes).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        let applied = MigrationRegistry::standard().apply(&conn, 1, SCHEMA_VERSION).unwrap();

        assert_eq!(applied, vec![2]);
        assert!(edit.has_index(Collection::Notes, CREATE_AT_INDEX).unwrap());
    }

    #[test]
    fn test_unregistered_versions_are_skipped() {
        let conn = Connection::open_in_memory().unwrap();
        let mut registry = MigrationRegistry::new();
        registry.register(1, create_initial_collections);
        registry.register(3, marker_table_step);

        let applied = registry.apply(&conn, 0, 3).unwrap();

        assert_eq!(applied, vec![1, 3]);
        assert_eq!(stored_version(&conn).unwrap(), 3);
    }

    #[test]
    fn test_failed_step_rolls_back_whole_chain() {
        let mut conn = Connection::open_in_memory().unwrap();
        let mut registry = MigrationRegistry::standard();
        registry.register(3, failing_step);

        {
            let tx = conn.transaction().unwrap();
            let err = registry.apply(&tx, 0, 3).unwrap_err();
            assert!(matches!(err, NotemarkError::Migration { version: 3, .. }));
            // tx dropped here: rolled back
        }

        assert_eq!(stored_version(&conn).unwrap(), 0);
        assert!(!SchemaEdit::new(&conn).has_collection(Collection::Notes).unwrap());
    }
}
