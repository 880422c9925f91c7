use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rusqlite::Connection;

use crate::error::{StoreError, StoreResult};

/// Schema version written to `PRAGMA user_version`. Bumping it wipes the
/// `places` table on the next open (see `apply_schema`).
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_PLACES_TABLE: &str = "CREATE TABLE IF NOT EXISTS places (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL
)";

/// Owner of the single SQLite connection used for the lifetime of the process.
/// Every operation is its own autocommit statement.
pub struct PlaceStore {
    pub(super) conn: Connection,
    path: Option<PathBuf>,
}

impl PlaceStore {
    /// Open (or create) the database file at `path` with the current schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_version(path, SCHEMA_VERSION)
    }

    /// Open the database file expecting a specific schema version.
    pub fn open_with_version(path: impl AsRef<Path>, version: u32) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut conn = Connection::open(path)?;
        apply_schema(&mut conn, version)?;
        debug!("opened place store at {}", path.display());

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory database, discarded when the store is dropped.
    pub fn open_in_memory() -> StoreResult<Self> {
        let mut conn = Connection::open_in_memory()?;
        apply_schema(&mut conn, SCHEMA_VERSION)?;
        Ok(Self { conn, path: None })
    }

    /// Backing file, or `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> StoreResult<u32> {
        read_user_version(&self.conn)
    }
}

fn read_user_version(conn: &Connection) -> StoreResult<u32> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

fn write_user_version(conn: &Connection, version: u32) -> StoreResult<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version}"))?;
    Ok(())
}

/// Bring the schema to `version`. An older stored version is handled by
/// dropping and recreating `places`, which discards every saved row.
fn apply_schema(conn: &mut Connection, version: u32) -> StoreResult<()> {
    let existing = read_user_version(conn)?;

    if existing > version {
        return Err(StoreError::SchemaDowngrade {
            found: existing,
            supported: version,
        });
    }

    let tx = conn.transaction()?;
    if existing == 0 {
        tx.execute_batch(CREATE_PLACES_TABLE)?;
        write_user_version(&tx, version)?;
        info!("created places schema at version {version}");
    } else if existing < version {
        let had_table: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'places')",
            [],
            |row| row.get(0),
        )?;
        let dropped: i64 = if had_table {
            tx.query_row("SELECT COUNT(*) FROM places", [], |row| row.get(0))?
        } else {
            0
        };
        tx.execute_batch("DROP TABLE IF EXISTS places")?;
        tx.execute_batch(CREATE_PLACES_TABLE)?;
        write_user_version(&tx, version)?;
        warn!(
            "upgraded places schema from version {existing} to {version}; \
             {dropped} saved place(s) were discarded"
        );
    } else {
        tx.execute_batch(CREATE_PLACES_TABLE)?;
    }
    tx.commit()?;

    Ok(())
}
