//! Versioned SQLite-backed record store.
//!
//! [`Storage`] owns at most one connection. It starts out closed; the first
//! operation (or an explicit [`Storage::open_or_reuse`]) opens the file and
//! runs any pending migrations. The connection sits behind a mutex that is
//! held for the whole open-and-migrate sequence, so callers racing on a cold
//! store all wait for, and then reuse, that single outcome.

use crate::core::migration::{stored_version, MigrationRegistry, SCHEMA_VERSION};
use crate::{Collection, FileRecord, NotemarkError, Record, Result, StoreConfig};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Pause between retries while another session holds the store locked during open.
const BLOCKED_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// How a call to [`Storage::open_or_reuse`] was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The cached connection was still valid.
    Reused,
    /// A new connection was opened; `applied` lists the migration versions
    /// that ran, empty when the store was already current.
    Opened { previous_version: u32, applied: Vec<u32> },
}

/// Transaction mode for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    ReadOnly,
    ReadWrite,
}

/// Handle to the note store. Share it as `Arc<Storage>`.
pub struct Storage {
    config: StoreConfig,
    registry: MigrationRegistry,
    target_version: u32,
    conn: Mutex<Option<Connection>>,
}

impl Storage {
    /// A closed handle on the store described by `config`, using the
    /// standard migration chain.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_migrations(config, MigrationRegistry::standard(), SCHEMA_VERSION)
    }

    /// A closed handle with a custom migration chain and target version.
    pub fn with_migrations(config: StoreConfig, registry: MigrationRegistry, target_version: u32) -> Self {
        Self {
            config,
            registry,
            target_version,
            conn: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn target_version(&self) -> u32 {
        self.target_version
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Opens and migrates the store, or reuses the connection already open.
    ///
    /// # Errors
    ///
    /// [`NotemarkError::Open`] if the file cannot be opened,
    /// [`NotemarkError::VersionConflict`] if it was upgraded past the target
    /// version, or [`NotemarkError::Migration`] if a migration step failed.
    pub fn open_or_reuse(&self) -> Result<OpenOutcome> {
        let mut slot = self.lock();
        self.ensure_open(&mut slot).map(|(_, outcome)| outcome)
    }

    /// Drops the connection. The next operation reopens it.
    pub fn close(&self) {
        self.lock().take();
    }

    /// Fetches the record with `id`, or `None` if there is none.
    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        let sql = format!("SELECT value FROM {} WHERE id = ?1", R::COLLECTION);
        let raw: Option<String> = self.transact(R::COLLECTION, Mode::ReadOnly, |tx| {
            tx.query_row(&sql, [id], |row| row.get(0)).optional()
        })?;
        raw.map(|json| decode(R::COLLECTION, &json)).transpose()
    }

    /// Inserts `item`, or overwrites the record with the same id.
    pub fn put<R: Record>(&self, item: &R) -> Result<()> {
        let json = serde_json::to_string(item).map_err(|e| NotemarkError::storage(R::COLLECTION, e))?;
        let sql = format!(
            "INSERT INTO {} (id, value) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET value = excluded.value",
            R::COLLECTION
        );
        self.transact(R::COLLECTION, Mode::ReadWrite, |tx| {
            tx.execute(&sql, rusqlite::params![item.id(), json]).map(|_| ())
        })
    }

    /// Deletes the record with `id`. A missing id is not an error.
    pub fn delete<R: Record>(&self, id: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::COLLECTION);
        self.transact(R::COLLECTION, Mode::ReadWrite, |tx| tx.execute(&sql, [id]).map(|_| ()))
    }

    pub fn save_file(&self, file: &FileRecord) -> Result<()> {
        self.put(file)
    }

    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>> {
        self.get(id)
    }

    /// Runs `op` in its own transaction against `collection`, opening the
    /// store first if needed.
    ///
    /// Any failure, including a failure to open, is reported against
    /// `collection`.
    pub(crate) fn transact<T, F>(&self, collection: Collection, mode: Mode, op: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    {
        let mut slot = self.lock();
        let (conn, _) = self.ensure_open(&mut slot).map_err(|e| match e {
            NotemarkError::Storage { .. } => e,
            other => NotemarkError::storage(collection, other),
        })?;

        let behavior = match mode {
            Mode::ReadOnly => TransactionBehavior::Deferred,
            Mode::ReadWrite => TransactionBehavior::Immediate,
        };
        let tx = conn
            .transaction_with_behavior(behavior)
            .map_err(|e| NotemarkError::storage(collection, e))?;
        let value = op(&tx).map_err(|e| NotemarkError::storage(collection, e))?;
        tx.commit().map_err(|e| NotemarkError::storage(collection, e))?;
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open<'a>(&self, slot: &'a mut Option<Connection>) -> Result<(&'a mut Connection, OpenOutcome)> {
        let (conn, outcome) = match slot.take() {
            Some(conn) => match self.is_current(&conn) {
                Ok(true) => (conn, OpenOutcome::Reused),
                Ok(false) => self.open_connection()?,
                Err(e) => {
                    *slot = Some(conn);
                    return Err(NotemarkError::Locked(e));
                }
            },
            None => self.open_connection()?,
        };
        Ok((slot.insert(conn), outcome))
    }

    /// Whether a cached connection still sees the version it was opened at.
    ///
    /// A store locked by another session is an error, not a stale
    /// connection; the connection stays cached.
    fn is_current(&self, conn: &Connection) -> rusqlite::Result<bool> {
        match stored_version(conn) {
            Ok(version) if version == self.target_version => Ok(true),
            Ok(version) => {
                log::info!("note store moved to version {version} in another session; reconnecting");
                Ok(false)
            }
            Err(e) if is_lock_contention(&e) => Err(e),
            Err(e) => {
                log::info!("cached note store connection is unusable ({e}); reconnecting");
                Ok(false)
            }
        }
    }

    fn open_connection(&self) -> Result<(Connection, OpenOutcome)> {
        let path = self.config.db_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(&path).map_err(NotemarkError::Open)?;
        conn.busy_handler(Some(wait_while_blocked)).map_err(NotemarkError::Open)?;

        let stored = stored_version(&conn).map_err(NotemarkError::Open)?;
        self.check_not_newer(stored)?;

        let (previous_version, applied) = if stored < self.target_version {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(NotemarkError::Open)?;
            // Another session may have upgraded while we waited for the lock.
            let current = stored_version(&tx).map_err(NotemarkError::Open)?;
            self.check_not_newer(current)?;
            let applied = self.registry.apply(&tx, current, self.target_version)?;
            tx.commit().map_err(|source| NotemarkError::Migration {
                version: self.target_version,
                source,
            })?;
            (current, applied)
        } else {
            (stored, Vec::new())
        };

        conn.busy_timeout(self.config.busy_timeout()).map_err(NotemarkError::Open)?;
        Ok((conn, OpenOutcome::Opened { previous_version, applied }))
    }

    fn check_not_newer(&self, stored: u32) -> Result<()> {
        if stored > self.target_version {
            return Err(NotemarkError::VersionConflict {
                stored,
                supported: self.target_version,
            });
        }
        Ok(())
    }
}

/// Busy handler installed while opening: the open stays pending until the
/// blocking session lets go.
fn wait_while_blocked(attempt: i32) -> bool {
    if attempt == 0 {
        log::warn!("note store is locked by another session; waiting for it to close");
    }
    std::thread::sleep(BLOCKED_RETRY_INTERVAL);
    true
}

fn is_lock_contention(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn decode<R: Record>(collection: Collection, json: &str) -> Result<R> {
    serde_json::from_str(json).map_err(|e| NotemarkError::storage(collection, e))
}
