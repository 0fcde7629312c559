//! Elevation rasters assembled from terrarium tiles.
//!
//! - [`terrarium`]: RGB to meters decoding of a single tile
//! - [`canvas`]: the stitched elevation grid and its crop
//! - [`normalize`]: robust min/max windowing and rescaling to 16 bits
//! - [`output`]: 16-bit TIFF / PNG serialization

pub mod canvas;
pub mod error;
pub mod normalize;
pub mod output;
pub mod terrarium;

pub use canvas::Canvas;
pub use error::{HeightmapError, HeightmapResult};
pub use normalize::{normalize, ElevationStats, NormalizationBounds, NormalizedRaster, OUTPUT_MAX};
pub use output::{encode_raster, write_raster, RasterFormat};
pub use terrarium::{decode_pixel, decode_tile, HeightTile};
