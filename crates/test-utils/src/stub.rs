//! In-memory tile source for pipeline and fetcher tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use terrain_common::TileCoord;
use tile_store::{FetchFailure, TileSource};

/// A [`TileSource`] serving canned bytes and counting every request.
///
/// Tiles without an explicit entry get the default tile, or a 404 when no
/// default is set.
#[derive(Debug, Default)]
pub struct StubTileSource {
    default_tile: Option<Bytes>,
    tiles: HashMap<TileCoord, Bytes>,
    failures: HashMap<TileCoord, u16>,
    delays: HashMap<TileCoord, Duration>,
    requests: AtomicUsize,
    requested: Mutex<Vec<TileCoord>>,
}

impl StubTileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for every tile without a specific entry.
    pub fn with_default_tile(mut self, bytes: impl Into<Bytes>) -> Self {
        self.default_tile = Some(bytes.into());
        self
    }

    /// Serve `bytes` for one tile.
    pub fn with_tile(mut self, coord: TileCoord, bytes: impl Into<Bytes>) -> Self {
        self.tiles.insert(coord, bytes.into());
        self
    }

    /// Answer requests for `coord` with an HTTP error status.
    pub fn with_failure(mut self, coord: TileCoord, status: u16) -> Self {
        self.failures.insert(coord, status);
        self
    }

    /// Hold the response for `coord` back by `delay`.
    pub fn with_delay(mut self, coord: TileCoord, delay: Duration) -> Self {
        self.delays.insert(coord, delay);
        self
    }

    /// Number of fetch calls received so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Tiles requested so far, in the order the requests arrived.
    pub fn requested(&self) -> Vec<TileCoord> {
        self.requested
            .lock()
            .map(|tiles| tiles.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TileSource for StubTileSource {
    async fn fetch(&self, coord: &TileCoord) -> Result<Bytes, FetchFailure> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(*coord);
        }

        if let Some(delay) = self.delays.get(coord) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(status) = self.failures.get(coord) {
            return Err(FetchFailure::status(*coord, *status));
        }

        self.tiles
            .get(coord)
            .or(self.default_tile.as_ref())
            .cloned()
            .ok_or_else(|| FetchFailure::status(*coord, 404))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_serves_and_counts() {
        let special = TileCoord::new(1, 1, 1);
        let broken = TileCoord::new(1, 0, 1);
        let stub = StubTileSource::new()
            .with_default_tile(vec![1u8])
            .with_tile(special, vec![2u8])
            .with_failure(broken, 500);

        tokio_test::block_on(async {
            assert_eq!(&stub.fetch(&TileCoord::new(1, 0, 0)).await.unwrap()[..], &[1]);
            assert_eq!(&stub.fetch(&special).await.unwrap()[..], &[2]);
            assert_eq!(stub.fetch(&broken).await.unwrap_err().status, Some(500));
        });

        assert_eq!(stub.request_count(), 3);
        assert_eq!(stub.requested().len(), 3);
    }

    #[test]
    fn test_stub_without_default_is_404() {
        let stub = StubTileSource::new();
        let failure = tokio_test::block_on(stub.fetch(&TileCoord::new(0, 0, 0))).unwrap_err();
        assert_eq!(failure.status, Some(404));
    }
}
