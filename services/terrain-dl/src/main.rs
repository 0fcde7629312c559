//! Terrarium elevation downloader.
//!
//! Downloads the elevation tiles covering an EPSG:3857 bounding box and
//! writes them as one cropped, normalized 16-bit raster:
//! - Prompts for the bounding box and zoom when they are not given
//! - Prints an output size estimate per zoom level
//! - Caches tiles on disk so re-runs only download what is missing

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::BinaryBytes;
use heightmap::{write_raster, RasterFormat};
use terrain_common::{BoundingBox, MAX_ZOOM};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use terrain_dl::estimate::{estimate, render_table};
use terrain_dl::{http_pipeline, DownloaderConfig, FailurePolicy};

#[derive(Parser, Debug)]
#[command(name = "terrain-dl")]
#[command(about = "Download terrarium elevation tiles and stitch them into a 16-bit heightmap")]
struct Args {
    /// Bounding box in EPSG:3857 meters: left,bottom,right,top
    #[arg(long, allow_hyphen_values = true)]
    bbox: Option<String>,

    /// Zoom level (0-15)
    #[arg(short, long)]
    zoom: Option<u32>,

    /// Output raster (.tif, .tiff or .png)
    #[arg(short, long, env = "TERRAIN_OUTPUT")]
    output: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, env = "TERRAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Tile cache directory
    #[arg(long, env = "TERRAIN_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Base URL of the terrarium tile service
    #[arg(long, env = "TERRAIN_TILE_URL")]
    base_url: Option<String>,

    /// Maximum concurrent tile fetches (0 = unlimited)
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// What to do with tiles that cannot be fetched
    #[arg(long, value_enum)]
    failure_policy: Option<FailurePolicy>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Load the config file, if any, and apply the explicit flags on top.
    fn config(&self) -> Result<DownloaderConfig> {
        let mut config = match &self.config {
            Some(path) => DownloaderConfig::from_yaml_file(path)?,
            None => DownloaderConfig::default(),
        };

        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = Some(cache_dir.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(max_concurrent) = self.max_concurrent {
            config.max_concurrent = max_concurrent;
        }
        if let Some(policy) = self.failure_policy {
            config.failure_policy = policy;
        }
        if let Some(timeout) = self.timeout_secs {
            config.request_timeout_secs = Some(timeout);
        }
        if self.no_progress {
            config.progress = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Print `message` and read one trimmed line from stdin.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        bail!("No input on stdin");
    }
    Ok(line.trim().to_string())
}

fn read_bbox(arg: Option<&str>) -> Result<BoundingBox> {
    if let Some(value) = arg {
        let bbox = BoundingBox::parse(value).context("Invalid --bbox")?;
        bbox.validate()?;
        return Ok(bbox);
    }

    println!("Copy the bounding box as EPSG:3857 coordinates, e.g. from https://boundingbox.klokantech.com (CSV format)");
    loop {
        let line = prompt("Bounding box (left,bottom,right,top): ")?;
        match BoundingBox::parse(&line).map_err(anyhow::Error::from).and_then(|b| {
            b.validate()?;
            Ok(b)
        }) {
            Ok(bbox) => return Ok(bbox),
            Err(e) => println!("{}", e),
        }
    }
}

fn read_zoom(arg: Option<u32>) -> Result<u32> {
    if let Some(zoom) = arg {
        if zoom > MAX_ZOOM {
            bail!("Zoom level {} is above the maximum of {}", zoom, MAX_ZOOM);
        }
        return Ok(zoom);
    }

    loop {
        let line = prompt(&format!("Zoom level (0-{}): ", MAX_ZOOM))?;
        match line.parse::<u32>() {
            Ok(zoom) if zoom <= MAX_ZOOM => return Ok(zoom),
            _ => println!("Enter a whole number between 0 and {}", MAX_ZOOM),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let config = args.config()?;
    RasterFormat::from_path(&config.output)?;

    let bbox = read_bbox(args.bbox.as_deref())?;
    println!("{}", render_table(&estimate(&bbox)));
    let zoom = read_zoom(args.zoom)?;

    info!(
        left = bbox.left,
        bottom = bbox.bottom,
        right = bbox.right,
        top = bbox.top,
        zoom,
        "Starting terrain download"
    );

    let pipeline = http_pipeline(&config)?;
    let rendered = pipeline
        .render(&bbox, zoom)
        .await
        .context("Failed to build heightmap")?;

    if !rendered.report.is_complete() {
        warn!(
            failed = rendered.report.failed.len(),
            "Some tiles are missing; their area is left at 0 before normalization"
        );
    }

    write_raster(&rendered.raster, &config.output)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;

    let stats = pipeline.fetcher().stats();
    info!(
        output = %config.output.display(),
        width = rendered.raster.width,
        height = rendered.raster.height,
        cache_hits = stats.cache_hits,
        downloads = stats.downloads,
        downloaded = %BinaryBytes(stats.bytes_downloaded),
        "Done"
    );

    Ok(())
}
