//! SQLite schema store for sticker packs.
//!
//! One [`StickerDb`] owns at most one connection. The connection is opened,
//! configured and migrated on first access; every later caller receives a
//! clone of the same [`DbHandle`]. Readers and writers share that handle and
//! are serialized by its lock.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, StickerError};
use crate::pack::{MAX_IDENTIFIER_LEN, MAX_NAME_LEN, MAX_PUBLISHER_LEN};

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "stickers.db";

pub const PACK_TABLE: &str = "sticker_pack";
pub const STICKER_TABLE: &str = "sticker";

/// SQL creating both tables. Length limits are enforced by the schema as
/// well as by validation.
fn schema_sql() -> String {
    format!(
        r"
-- One row per sticker pack
CREATE TABLE IF NOT EXISTS {PACK_TABLE} (
    identifier TEXT PRIMARY KEY NOT NULL
        CHECK (length(identifier) BETWEEN 1 AND {MAX_IDENTIFIER_LEN}),
    name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND {MAX_NAME_LEN}),
    publisher TEXT NOT NULL CHECK (length(publisher) BETWEEN 1 AND {MAX_PUBLISHER_LEN}),
    tray_image TEXT NOT NULL,
    publisher_email TEXT,
    publisher_website TEXT,
    privacy_policy_website TEXT,
    license_agreement_website TEXT,
    android_store_link TEXT,
    ios_store_link TEXT,
    image_data_version TEXT NOT NULL DEFAULT '1',
    avoid_cache INTEGER NOT NULL DEFAULT 0,
    animated INTEGER NOT NULL DEFAULT 0
);

-- Stickers belong to exactly one pack and die with it
CREATE TABLE IF NOT EXISTS {STICKER_TABLE} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pack_identifier TEXT NOT NULL
        REFERENCES {PACK_TABLE}(identifier) ON DELETE CASCADE ON UPDATE CASCADE,
    file_name TEXT NOT NULL CHECK (length(file_name) > 0),
    emojis TEXT NOT NULL,
    accessibility_text TEXT NOT NULL,
    validity_marker TEXT NOT NULL DEFAULT '',
    UNIQUE (pack_identifier, file_name)
);

CREATE INDEX IF NOT EXISTS idx_sticker_pack ON {STICKER_TABLE}(pack_identifier);
"
    )
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Shared handle to the single open connection.
#[derive(Debug, Clone)]
pub struct DbHandle {
    conn: Arc<Mutex<Connection>>,
}

impl DbHandle {
    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StickerError::Other("Database lock poisoned".to_string()))
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside a transaction. Commits when `f` succeeds; any error
    /// rolls back every statement issued by `f`.
    pub fn transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| StickerError::storage("begin transaction", e))?;
        let value = f(&tx)?;
        tx.commit()
            .map_err(|e| StickerError::storage("commit transaction", e))?;
        Ok(value)
    }

    /// True if both handles point at the same connection.
    pub fn same_connection(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }
}

/// Lazily opened sticker database.
#[derive(Debug)]
pub struct StickerDb {
    location: Location,
    handle: Mutex<Option<DbHandle>>,
    opened: AtomicUsize,
}

impl StickerDb {
    /// Database at `path`. Nothing is touched until first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::File(path.into()))
    }

    /// Database in `data_dir` using the standard file name.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DB_FILE_NAME))
    }

    /// Private in-memory database (tests, dry runs).
    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    fn with_location(location: Location) -> Self {
        Self {
            location,
            handle: Mutex::new(None),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(p) => Some(p),
            Location::Memory => None,
        }
    }

    /// Handle for mutations.
    pub fn open_for_write(&self) -> Result<DbHandle> {
        self.handle()
    }

    /// Handle for queries. Same connection as [`Self::open_for_write`].
    pub fn open_for_read(&self) -> Result<DbHandle> {
        self.handle()
    }

    /// Whether the connection has been opened yet.
    pub fn is_open(&self) -> bool {
        self.handle.lock().is_ok_and(|h| h.is_some())
    }

    /// How many times a connection was opened. Stays at one for the
    /// lifetime of this value.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn handle(&self) -> Result<DbHandle> {
        let mut slot = self
            .handle
            .lock()
            .map_err(|_| StickerError::Other("Database handle lock poisoned".to_string()))?;
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }
        let conn = self.connect()?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        let handle = DbHandle {
            conn: Arc::new(Mutex::new(conn)),
        };
        *slot = Some(handle.clone());
        Ok(handle)
    }

    #[instrument(skip(self), fields(location = ?self.location))]
    fn connect(&self) -> Result<Connection> {
        let conn = match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StickerError::Other(format!(
                            "Failed to create directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
                debug!(path = %path.display(), "Opening sticker database");
                Connection::open(path).map_err(|e| StickerError::storage("open database", e))?
            }
            Location::Memory => Connection::open_in_memory()
                .map_err(|e| StickerError::storage("open in-memory database", e))?,
        };
        configure(&conn)?;
        migrate(&conn)?;
        info!(version = SCHEMA_VERSION, "Sticker database ready");
        Ok(conn)
    }
}

/// Per-connection settings. Foreign keys are off by default in SQLite.
fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| StickerError::storage("enable foreign keys", e))?;
    Ok(())
}

/// Bring the schema to [`SCHEMA_VERSION`]. A database written by any other
/// version is wiped: both tables are dropped and recreated.
fn migrate(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StickerError::storage("read schema version", e))?;

    if version != 0 && version != SCHEMA_VERSION {
        warn!(
            from = version,
            to = SCHEMA_VERSION,
            "Schema version changed, dropping all sticker data"
        );
        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {STICKER_TABLE}; DROP TABLE IF EXISTS {PACK_TABLE};"
        ))
        .map_err(|e| StickerError::storage("drop tables", e))?;
    }

    conn.execute_batch(&schema_sql())
        .map_err(|e| StickerError::storage("create schema", e))?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(|e| StickerError::storage("write schema version", e))?;
    Ok(())
}
