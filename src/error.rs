use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the place store. Callers only take their success path
/// on `Ok`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create data directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("place name must not be empty")]
    EmptyName,

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaDowngrade { found: u32, supported: u32 },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
