//! Error types for heightmap processing.

use thiserror::Error;

/// Result type alias using HeightmapError.
pub type HeightmapResult<T> = Result<T, HeightmapError>;

#[derive(Debug, Error)]
pub enum HeightmapError {
    #[error("Failed to decode tile image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Unexpected tile size {width}x{height} (expected {expected}x{expected})")]
    TileSize {
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("Tile holds {len} heights (expected {expected})")]
    TileLength { len: usize, expected: usize },

    #[error("Tile block at row {row}, col {col} does not fit a {width}x{height} canvas")]
    OutOfCanvas {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },

    #[error("Crop window {0} does not fit the canvas")]
    InvalidCrop(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
