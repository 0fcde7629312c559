//! Error types for terrain geometry.

use thiserror::Error;

use crate::bbox::BboxParseError;

/// Result type alias using TerrainError.
pub type TerrainResult<T> = Result<T, TerrainError>;

/// Errors raised while validating user input for the tile geometry.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error(transparent)]
    BboxParse(#[from] BboxParseError),

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Invalid zoom level {zoom} (must be 0-{max})")]
    InvalidZoom { zoom: u32, max: u32 },

    #[error("Tile index {index} out of range for a tileset of {count} tiles")]
    TileIndexOutOfRange { index: usize, count: usize },
}
