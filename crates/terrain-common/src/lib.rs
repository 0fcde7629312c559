//! Common types and utilities shared across the terrain-dl crates.
//!
//! Covers the EPSG:3857 bounding box, slippy-map tile coordinates, the
//! coordinate projector and the [`TileSet`] describing the rectangular grid
//! of tiles that covers a requested region.

pub mod bbox;
pub mod error;
pub mod tile;
pub mod tileset;

pub use bbox::{BboxParseError, BoundingBox};
pub use error::{TerrainError, TerrainResult};
pub use tile::{
    project_to_pixel, project_to_tile, TileCoord, TileIndexPair, EARTH_HALF_CIRCUMFERENCE,
    MAX_ZOOM, TILE_SIZE,
};
pub use tileset::{PixelBounds, TileSet};
