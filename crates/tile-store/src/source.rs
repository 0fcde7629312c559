//! Remote tile sources.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use terrain_common::TileCoord;
use tracing::{debug, instrument};

use crate::cache::DiskTileCache;
use crate::error::TileStoreResult;

/// Base URL of the public terrarium elevation tile set.
pub const DEFAULT_TILE_URL: &str = "https://s3.amazonaws.com/elevation-tiles-prod/terrarium";

/// A tile the remote service did not deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub coord: TileCoord,
    /// HTTP status, `None` when the request never got a response.
    pub status: Option<u16>,
    pub reason: String,
}

impl FetchFailure {
    pub fn status(coord: TileCoord, status: u16) -> Self {
        Self {
            coord,
            status: Some(status),
            reason: format!("HTTP {}", status),
        }
    }

    pub fn transport(coord: TileCoord, reason: impl Into<String>) -> Self {
        Self {
            coord,
            status: None,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tile {}: {}", self.coord, self.reason)
    }
}

/// Something that can deliver the encoded bytes of a tile.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Fetch one tile. Failures are per tile and never fatal.
    async fn fetch(&self, coord: &TileCoord) -> Result<Bytes, FetchFailure>;
}

#[async_trait]
impl<T: TileSource + ?Sized> TileSource for Arc<T> {
    async fn fetch(&self, coord: &TileCoord) -> Result<Bytes, FetchFailure> {
        (**self).fetch(coord).await
    }
}

/// HTTP tile source for `{base_url}/{z}/{x}/{y}.png`.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    client: Client,
    base_url: String,
}

impl HttpTileSource {
    /// Create a source without a request timeout.
    pub fn new(base_url: impl Into<String>) -> TileStoreResult<Self> {
        Self::with_timeout(base_url, None)
    }

    /// Create a source, optionally bounding each request by `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> TileStoreResult<Self> {
        let mut builder = Client::builder().tcp_nodelay(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL of a tile.
    pub fn tile_url(&self, coord: &TileCoord) -> String {
        format!("{}/{}", self.base_url, DiskTileCache::key(coord))
    }
}

#[async_trait]
impl TileSource for HttpTileSource {
    #[instrument(skip(self), fields(tile = %coord))]
    async fn fetch(&self, coord: &TileCoord) -> Result<Bytes, FetchFailure> {
        let url = self.tile_url(coord);
        debug!(url = %url, "Downloading tile");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchFailure::transport(*coord, e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(FetchFailure::status(*coord, response.status().as_u16()));
        }

        response
            .bytes()
            .await
            .map_err(|e| FetchFailure::transport(*coord, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single request with `response` on an ephemeral local port.
    async fn serve_once(response: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        addr
    }

    #[test]
    fn test_tile_url() {
        let source = HttpTileSource::new(DEFAULT_TILE_URL).unwrap();
        let coord = TileCoord::new(12, 655, 1407);
        assert_eq!(
            source.tile_url(&coord),
            "https://s3.amazonaws.com/elevation-tiles-prod/terrarium/12/655/1407.png"
        );
    }

    #[test]
    fn test_tile_url_trailing_slash() {
        let source = HttpTileSource::new("http://localhost:9000/tiles/").unwrap();
        assert_eq!(
            source.tile_url(&TileCoord::new(0, 0, 0)),
            "http://localhost:9000/tiles/0/0/0.png"
        );
    }

    #[test]
    fn test_failure_display() {
        let failure = FetchFailure::status(TileCoord::new(5, 3, 7), 404);
        assert_eq!(failure.to_string(), "tile 5/3/7: HTTP 404");
        assert_eq!(failure.status, Some(404));
    }

    #[tokio::test]
    async fn test_fetch_ok_returns_body() {
        let addr = serve_once(
            b"HTTP/1.1 200 OK\r\ncontent-length: 4\r\nconnection: close\r\n\r\ntile",
        )
        .await;
        let source = HttpTileSource::new(format!("http://{}", addr)).unwrap();

        let bytes = source.fetch(&TileCoord::new(10, 512, 511)).await.unwrap();
        assert_eq!(&bytes[..], b"tile");
    }

    #[tokio::test]
    async fn test_fetch_not_found_keeps_status() {
        let addr = serve_once(
            b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let source = HttpTileSource::new(format!("http://{}", addr)).unwrap();
        let coord = TileCoord::new(10, 512, 511);

        let failure = source.fetch(&coord).await.unwrap_err();
        assert_eq!(failure.coord, coord);
        assert_eq!(failure.status, Some(404));
        assert_eq!(failure.reason, "HTTP 404");
    }

    #[tokio::test]
    async fn test_fetch_refused_connection_has_no_status() {
        // Nothing listens on port 1.
        let source = HttpTileSource::new("http://127.0.0.1:1").unwrap();
        let coord = TileCoord::new(3, 1, 2);

        let failure = source.fetch(&coord).await.unwrap_err();
        assert_eq!(failure.coord, coord);
        assert_eq!(failure.status, None);
        assert!(!failure.reason.is_empty());
    }
}
