//! Terrarium elevation downloader.
//!
//! Projects an EPSG:3857 bounding box onto the slippy-map tile grid, fetches
//! the covering tiles concurrently through a disk cache, stitches them into
//! one canvas, crops it to the box and normalizes it to 16 bits.

pub mod config;
pub mod estimate;
pub mod pipeline;

use anyhow::{Context, Result};
use tile_store::{DiskTileCache, HttpTileSource, TileFetcher};
use tracing::info;

pub use config::{DownloaderConfig, FailurePolicy};
pub use pipeline::{
    Pipeline, PipelineError, PipelineOptions, PipelineOutput, PipelineReport, PipelineResult,
    RenderedHeightmap,
};

impl From<&DownloaderConfig> for PipelineOptions {
    fn from(config: &DownloaderConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent,
            failure_policy: config.failure_policy,
            show_progress: config.progress,
        }
    }
}

/// Build a pipeline fetching over HTTP with the configured cache.
pub fn http_pipeline(config: &DownloaderConfig) -> Result<Pipeline<HttpTileSource>> {
    let cache_dir = config.resolve_cache_dir()?;
    let source = HttpTileSource::with_timeout(config.base_url.clone(), config.request_timeout())
        .context("Failed to create HTTP tile source")?;

    info!(
        cache_dir = %cache_dir.display(),
        base_url = %config.base_url,
        "Configured tile source"
    );

    let fetcher = TileFetcher::new(DiskTileCache::new(cache_dir), source);
    Ok(Pipeline::new(fetcher, PipelineOptions::from(config)))
}
