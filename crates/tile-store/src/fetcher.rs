//! Cache-first tile fetching.
//!
//! A cached tile is returned as-is. Otherwise the tile is requested from the
//! [`TileSource`], persisted to the cache, and returned. Concurrent calls for
//! different tiles touch disjoint files and never contend; duplicate
//! concurrent calls for the same tile are not coordinated.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bytes::Bytes;
use terrain_common::TileCoord;
use tracing::{debug, instrument};

use crate::cache::DiskTileCache;
use crate::error::TileStoreResult;
use crate::source::{FetchFailure, TileSource};

/// Outcome of fetching one tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileFetch {
    /// Served from the on-disk cache.
    Cached(Bytes),
    /// Downloaded and written to the cache.
    Downloaded(Bytes),
    /// The remote source did not deliver the tile.
    Failed(FetchFailure),
}

impl TileFetch {
    /// The tile bytes, if the fetch succeeded.
    pub fn into_bytes(self) -> Result<Bytes, FetchFailure> {
        match self {
            TileFetch::Cached(bytes) | TileFetch::Downloaded(bytes) => Ok(bytes),
            TileFetch::Failed(failure) => Err(failure),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, TileFetch::Cached(_))
    }
}

/// Fetch statistics for the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub cache_hits: usize,
    pub downloads: usize,
    pub failures: usize,
    pub bytes_downloaded: u64,
}

/// Tile fetcher backed by a disk cache and a remote source.
pub struct TileFetcher<S> {
    cache: DiskTileCache,
    source: S,
    cache_hits: AtomicUsize,
    downloads: AtomicUsize,
    failures: AtomicUsize,
    bytes_downloaded: AtomicU64,
}

impl<S> std::fmt::Debug for TileFetcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileFetcher")
            .field("cache", &self.cache)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<S> TileFetcher<S> {
    pub fn new(cache: DiskTileCache, source: S) -> Self {
        Self {
            cache,
            source,
            cache_hits: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            bytes_downloaded: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &DiskTileCache {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get fetch statistics for this session.
    pub fn stats(&self) -> FetchStats {
        FetchStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            downloads: self.downloads.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }
}

impl<S: TileSource> TileFetcher<S> {
    /// Fetch a tile, using the cache if available.
    ///
    /// Only cache I/O errors are returned as `Err`; a tile the source could
    /// not deliver comes back as [`TileFetch::Failed`].
    #[instrument(skip(self), fields(tile = %coord))]
    pub async fn fetch(&self, coord: &TileCoord) -> TileStoreResult<TileFetch> {
        if let Some(bytes) = self.cache.read(coord).await? {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(TileFetch::Cached(bytes));
        }

        let bytes = match self.source.fetch(coord).await {
            Ok(bytes) => bytes,
            Err(failure) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                return Ok(TileFetch::Failed(failure));
            }
        };

        self.cache.write(coord, &bytes).await?;

        self.downloads.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        debug!(bytes = bytes.len(), "Downloaded tile");

        Ok(TileFetch::Downloaded(bytes))
    }
}
