//! Concurrent fetch / decode / assemble pipeline.
//!
//! Every tile gets its own fetch task. Successful fetches are sent as
//! `(index, bytes)` over one channel to a single assembler task that owns the
//! canvas, decodes each tile and writes it at the position implied by its
//! row-major index. Once every fetch task has finished, a `Finished` message
//! tells the assembler to hand the canvas back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::future::join_all;
use heightmap::{decode_tile, normalize, Canvas, HeightmapError, NormalizedRaster};
use indicatif::{ProgressBar, ProgressStyle};
use terrain_common::{BoundingBox, TerrainError, TileCoord, TileSet};
use thiserror::Error;
use tile_store::{FetchFailure, TileFetch, TileFetcher, TileSource, TileStoreError};
use tokio::sync::{mpsc, AcquireError, Semaphore};
use tokio::task::JoinError;
use tracing::{debug, info, instrument, warn};

use crate::config::FailurePolicy;

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{} of {total} tiles could not be fetched (first: {})", .failed.len(), first_failure(.failed))]
    TilesFailed {
        total: usize,
        failed: Vec<FetchFailure>,
    },

    #[error(transparent)]
    Store(#[from] TileStoreError),

    #[error(transparent)]
    Heightmap(#[from] HeightmapError),

    #[error(transparent)]
    Geometry(#[from] TerrainError),

    #[error("Pipeline task failed: {0}")]
    Task(#[from] JoinError),

    #[error("Concurrency limiter closed: {0}")]
    Limiter(#[from] AcquireError),
}

fn first_failure(failed: &[FetchFailure]) -> String {
    failed
        .first()
        .map(|f| f.to_string())
        .unwrap_or_default()
}

/// Knobs for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Maximum in-flight fetches, 0 for one task per tile with no limit.
    pub max_concurrent: usize,
    pub failure_policy: FailurePolicy,
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 32,
            failure_policy: FailurePolicy::Skip,
            show_progress: false,
        }
    }
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub tiles: usize,
    pub cached: usize,
    pub downloaded: usize,
    /// Tiles left at 0 on the canvas.
    pub failed: Vec<FetchFailure>,
    pub elapsed: Duration,
}

impl PipelineReport {
    /// True when every tile made it onto the canvas.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_coords(&self) -> Vec<TileCoord> {
        self.failed.iter().map(|f| f.coord).collect()
    }
}

/// The assembled (uncropped) canvas and the run summary.
#[derive(Debug)]
pub struct PipelineOutput {
    pub canvas: Canvas,
    pub report: PipelineReport,
}

/// A cropped, normalized heightmap.
#[derive(Debug)]
pub struct RenderedHeightmap {
    pub tileset: TileSet,
    pub raster: NormalizedRaster,
    pub report: PipelineReport,
}

enum TileMessage {
    Tile { index: usize, bytes: Bytes },
    Finished,
}

/// What happened to one tile.
enum TileOutcome {
    Cached,
    Downloaded,
    Failed(FetchFailure),
}

/// Runs the fetch / assemble pipeline over a [`TileSet`].
pub struct Pipeline<S> {
    fetcher: Arc<TileFetcher<S>>,
    options: PipelineOptions,
}

impl<S> Pipeline<S> {
    pub fn new(fetcher: TileFetcher<S>, options: PipelineOptions) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            options,
        }
    }

    pub fn fetcher(&self) -> &TileFetcher<S> {
        &self.fetcher
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }
}

impl<S: TileSource + 'static> Pipeline<S> {
    /// Validate the request, assemble the canvas, crop it to the bounding
    /// box and normalize it.
    pub async fn render(&self, bbox: &BoundingBox, zoom: u32) -> PipelineResult<RenderedHeightmap> {
        let tileset = TileSet::try_new(bbox, zoom)?;

        let PipelineOutput { canvas, report } = self.run(&tileset).await?;

        let bounds = tileset.pixel_bounds();
        let cropped = canvas.into_cropped(&bounds)?;
        debug!(
            width = cropped.width(),
            height = cropped.height(),
            "Cropped canvas to bounding box"
        );

        let raster = normalize(&cropped);
        Ok(RenderedHeightmap {
            tileset,
            raster,
            report,
        })
    }

    /// Fetch every tile of `tileset` and assemble the full canvas.
    #[instrument(skip(self, tileset), fields(zoom = tileset.zoom(), tiles = tileset.count()))]
    pub async fn run(&self, tileset: &TileSet) -> PipelineResult<PipelineOutput> {
        let start = Instant::now();
        let total = tileset.count();
        info!(
            width = tileset.width(),
            height = tileset.height(),
            max_concurrent = self.options.max_concurrent,
            "Starting tile pipeline"
        );

        let download_bar = self.progress_bar(total, "download");
        let process_bar = self.progress_bar(total, "process");

        let (tx, rx) = mpsc::unbounded_channel();
        let assembler = tokio::spawn(assemble(
            rx,
            Canvas::for_tileset(tileset),
            tileset.clone(),
            process_bar.clone(),
        ));

        let limiter = match self.options.max_concurrent {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        let mut handles = Vec::with_capacity(total);
        for (index, coord) in tileset.tiles().into_iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let limiter = limiter.clone();
            let tx = tx.clone();
            let bar = download_bar.clone();

            handles.push(tokio::spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => Some(limiter.acquire_owned().await?),
                    None => None,
                };

                let send = |bytes| {
                    if tx.send(TileMessage::Tile { index, bytes }).is_err() {
                        debug!(tile = %coord, "Assembler stopped; dropping tile");
                    }
                };
                let outcome = match fetcher.fetch(&coord).await? {
                    TileFetch::Cached(bytes) => {
                        send(bytes);
                        TileOutcome::Cached
                    }
                    TileFetch::Downloaded(bytes) => {
                        send(bytes);
                        TileOutcome::Downloaded
                    }
                    TileFetch::Failed(failure) => {
                        warn!(tile = %coord, reason = %failure.reason, "Tile fetch failed");
                        TileOutcome::Failed(failure)
                    }
                };
                bar.inc(1);
                Ok::<_, PipelineError>(outcome)
            }));
        }

        // Every fetch task must finish before the sentinel goes out.
        let results = join_all(handles).await;
        download_bar.finish_and_clear();
        // The assembler may already have stopped on a decode error.
        let _ = tx.send(TileMessage::Finished);
        drop(tx);

        let canvas = assembler.await?;
        process_bar.finish_and_clear();

        let mut cached = 0;
        let mut downloaded = 0;
        let mut failed = Vec::new();
        for result in results {
            match result?? {
                TileOutcome::Cached => cached += 1,
                TileOutcome::Downloaded => downloaded += 1,
                TileOutcome::Failed(failure) => failed.push(failure),
            }
        }
        let canvas = canvas?;

        failed.sort_by_key(|f| (f.coord.y, f.coord.x));
        let report = PipelineReport {
            tiles: total,
            cached,
            downloaded,
            failed,
            elapsed: start.elapsed(),
        };

        info!(
            tiles = report.tiles,
            cached = report.cached,
            downloaded = report.downloaded,
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Tile pipeline finished"
        );

        if !report.is_complete() && self.options.failure_policy == FailurePolicy::Abort {
            return Err(PipelineError::TilesFailed {
                total,
                failed: report.failed,
            });
        }

        Ok(PipelineOutput { canvas, report })
    }

    fn progress_bar(&self, len: usize, label: &'static str) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {msg:>8} {bar:40.cyan/blue} {pos}/{len} tiles")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        bar.set_message(label);
        bar
    }
}

/// Sole owner of the canvas while tiles are arriving.
async fn assemble(
    mut rx: mpsc::UnboundedReceiver<TileMessage>,
    mut canvas: Canvas,
    tileset: TileSet,
    bar: ProgressBar,
) -> PipelineResult<Canvas> {
    while let Some(message) = rx.recv().await {
        let (index, bytes) = match message {
            TileMessage::Tile { index, bytes } => (index, bytes),
            TileMessage::Finished => break,
        };

        let tile = decode_tile(&bytes)?;
        let (row, col) = tileset.pixel_origin(index)?;
        canvas.place_tile(row, col, &tile)?;

        debug!(index, row, col, "Placed tile");
        bar.inc(1);
    }
    Ok(canvas)
}
