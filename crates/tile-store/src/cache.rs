//! On-disk tile cache mirroring the remote `{z}/{x}/{y}.png` layout.
//!
//! Entries are written once and never invalidated. Reads do not check the
//! content of a cached file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use terrain_common::TileCoord;
use tokio::fs;
use tracing::debug;

use crate::error::{TileStoreError, TileStoreResult};

/// File extension of cached tiles.
const TILE_EXTENSION: &str = "png";

/// Tile cache rooted at an explicit directory.
#[derive(Debug, Clone)]
pub struct DiskTileCache {
    root: PathBuf,
}

impl DiskTileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative cache key of a tile, `"{z}/{x}/{y}.png"`.
    pub fn key(coord: &TileCoord) -> String {
        format!("{}.{}", coord.cache_key(), TILE_EXTENSION)
    }

    /// Path of the cache file for a tile.
    pub fn path(&self, coord: &TileCoord) -> PathBuf {
        self.root
            .join(coord.z.to_string())
            .join(coord.x.to_string())
            .join(format!("{}.{}", coord.y, TILE_EXTENSION))
    }

    /// Read a cached tile, `None` if it has not been stored yet.
    pub async fn read(&self, coord: &TileCoord) -> TileStoreResult<Option<Bytes>> {
        let path = self.path(coord);
        match fs::read(&path).await {
            Ok(data) => {
                debug!(tile = %coord, bytes = data.len(), "Cache hit");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TileStoreError::io(path, e)),
        }
    }

    /// Persist a tile, creating parent directories as needed.
    ///
    /// The data is written to a `.partial` file first and renamed into place
    /// so an interrupted run never leaves a truncated entry behind.
    pub async fn write(&self, coord: &TileCoord, data: &[u8]) -> TileStoreResult<PathBuf> {
        let path = self.path(coord);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| TileStoreError::io(parent, e))?;
        }

        let partial = path.with_extension(format!("{}.partial", TILE_EXTENSION));
        fs::write(&partial, data)
            .await
            .map_err(|e| TileStoreError::io(&partial, e))?;
        fs::rename(&partial, &path)
            .await
            .map_err(|e| TileStoreError::io(&path, e))?;

        debug!(tile = %coord, path = %path.display(), "Stored tile in cache");
        Ok(path)
    }
}
