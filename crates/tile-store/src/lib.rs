//! Tile storage: the on-disk tile cache, the remote tile source and the
//! cache-first fetcher that combines them.

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod source;

pub use cache::DiskTileCache;
pub use error::{TileStoreError, TileStoreResult};
pub use fetcher::{FetchStats, TileFetch, TileFetcher};
pub use source::{FetchFailure, HttpTileSource, TileSource, DEFAULT_TILE_URL};
