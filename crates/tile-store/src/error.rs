//! Error types for tile storage.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using TileStoreError.
pub type TileStoreResult<T> = Result<T, TileStoreError>;

/// Fatal tile storage errors.
///
/// A tile the remote service refuses is not an error here; it is reported
/// as [`crate::TileFetch::Failed`] so the caller can decide what to do.
#[derive(Debug, Error)]
pub enum TileStoreError {
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl TileStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TileStoreError::Io {
            path: path.into(),
            source,
        }
    }
}
