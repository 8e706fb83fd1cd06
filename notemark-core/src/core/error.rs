//! Error types for the Notemark core library.

use crate::Collection;
use thiserror::Error;

/// All errors that can occur within the Notemark core library.
///
/// Selection problems are deliberately absent: a missing selection is
/// `None` and an unmappable offset makes restore a silent no-op.
#[derive(Debug, Error)]
pub enum NotemarkError {
    /// A get, put, delete or scan against one collection failed.
    #[error("Operation on {collection} failed: {source}")]
    Storage {
        collection: Collection,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The store file could not be opened.
    #[error("Failed to open store: {0}")]
    Open(#[source] rusqlite::Error),

    /// Another session held the store locked past the busy timeout.
    #[error("Store is locked by another session: {0}")]
    Locked(#[source] rusqlite::Error),

    /// A migration step failed; the upgrade transaction was rolled back.
    #[error("Migration to version {version} failed: {source}")]
    Migration {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },

    /// The store on disk was upgraded past the version this build understands.
    #[error("Store is at version {stored} but only version {supported} is supported")]
    VersionConflict { stored: u32, supported: u32 },

    /// A caller-supplied argument was rejected before touching the store.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration or record JSON could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`NotemarkError`].
pub type Result<T> = std::result::Result<T, NotemarkError>;

impl NotemarkError {
    /// Wraps any lower-level failure with the collection it happened in.
    pub fn storage<E>(collection: Collection, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            collection,
            source: Box::new(source),
        }
    }

    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage { collection, source } => format!("Failed to access {collection}: {source}"),
            Self::Open(_) => "Could not open the note store".to_string(),
            Self::Locked(_) => "The note store is busy in another window. Please try again.".to_string(),
            Self::Migration { version, .. } => format!("Could not upgrade the note store to version {version}"),
            Self::VersionConflict { .. } => {
                "The note store was upgraded by a newer session. Please reload.".to_string()
            }
            Self::InvalidArgument(msg) => msg.clone(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}
