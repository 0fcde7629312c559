//! Slippy-map tile coordinates and the EPSG:3857 to tile projection.
//!
//! Tiles are 256x256 pixels. At zoom `z` the world is split into `2^z`
//! columns (west to east) and `2^z` rows (north to south), so increasing
//! projected `y` maps to a decreasing tile row.

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};

/// Half the projected world circumference in EPSG:3857 meters.
pub const EARTH_HALF_CIRCUMFERENCE: f64 = 20037508.34278924;

/// Edge length of a tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level served by the terrarium tile set.
pub const MAX_ZOOM: u32 = 15;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x), increases eastward
    pub x: u32,
    /// Row (y), increases southward
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Generate a cache key string.
    pub fn cache_key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Tile column/row pair returned by [`project_to_tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndexPair {
    pub x: u32,
    pub y: u32,
}

/// Reject zoom levels the tile service does not publish.
pub fn validate_zoom(zoom: u32) -> TerrainResult<()> {
    if zoom > MAX_ZOOM {
        return Err(TerrainError::InvalidZoom {
            zoom,
            max: MAX_ZOOM,
        });
    }
    Ok(())
}

/// Number of tiles along one axis at `zoom`.
pub fn tiles_per_axis(zoom: u32) -> u32 {
    1u32 << zoom
}

/// Fractional tile position of a projected coordinate.
fn tile_space(coord: (f64, f64), zoom: u32) -> (f64, f64) {
    let r = EARTH_HALF_CIRCUMFERENCE;
    let u = (r + coord.0) / (2.0 * r);
    let v = (r - coord.1) / (2.0 * r);

    let n = tiles_per_axis(zoom) as f64;
    (u * n, v * n)
}

fn clamp_tile(value: f64, zoom: u32) -> u32 {
    let max = (tiles_per_axis(zoom) - 1) as f64;
    value.floor().clamp(0.0, max) as u32
}

/// Return the tile that an EPSG:3857 coordinate falls into.
///
/// Coordinates on the east or south edge of the world are clamped onto the
/// last column/row.
pub fn project_to_tile(coord: (f64, f64), zoom: u32) -> TileIndexPair {
    let (tx, ty) = tile_space(coord, zoom);
    TileIndexPair {
        x: clamp_tile(tx, zoom),
        y: clamp_tile(ty, zoom),
    }
}

/// Return the pixel offset of a coordinate inside its tile.
///
/// The offset is measured from the tile's top-left corner, in `[0, 256]`.
/// It only reaches 256 for coordinates on the clamped world edge.
pub fn project_to_pixel(coord: (f64, f64), zoom: u32) -> (f64, f64) {
    let (tx, ty) = tile_space(coord, zoom);
    let tile = project_to_tile(coord, zoom);
    let size = TILE_SIZE as f64;

    (
        (tx - tile.x as f64) * size,
        (ty - tile.y as f64) * size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_center_of_world() {
        let tile = project_to_tile((0.0, 0.0), 10);
        assert_eq!(tile, TileIndexPair { x: 512, y: 512 });

        let (px, py) = project_to_pixel((0.0, 0.0), 10);
        assert_eq!(px, 0.0);
        assert_eq!(py, 0.0);
    }

    #[test]
    fn test_zoom_zero_is_single_tile() {
        let r = EARTH_HALF_CIRCUMFERENCE;
        for coord in [(-r, r), (0.0, 0.0), (r * 0.5, -r * 0.5)] {
            assert_eq!(project_to_tile(coord, 0), TileIndexPair { x: 0, y: 0 });
        }
    }

    #[test]
    fn test_world_corners() {
        let r = EARTH_HALF_CIRCUMFERENCE;

        // North-west corner is tile (0, 0) with no pixel offset.
        assert_eq!(project_to_tile((-r, r), 4), TileIndexPair { x: 0, y: 0 });
        assert_eq!(project_to_pixel((-r, r), 4), (0.0, 0.0));

        // South-east corner clamps onto the last tile, at its far edge.
        assert_eq!(project_to_tile((r, -r), 4), TileIndexPair { x: 15, y: 15 });
        let (px, py) = project_to_pixel((r, -r), 4);
        assert!((px - 256.0).abs() < 1e-6);
        assert!((py - 256.0).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_offset_of_small_step() {
        // 10 km east/north of the origin at zoom 10 is ~65.4 pixels into the tile.
        let (px, py) = project_to_pixel((10000.0, 10000.0), 10);
        assert!((px - 65.4133).abs() < 1e-3, "px = {}", px);
        assert!((py - 190.5867).abs() < 1e-3, "py = {}", py);
    }

    #[test]
    fn test_projection_is_monotonic() {
        let r = EARTH_HALF_CIRCUMFERENCE;
        for zoom in [0, 3, 10, 15] {
            let mut last_x = 0;
            let mut last_y = u32::MAX;
            for step in 0..=200 {
                let value = -r + (2.0 * r) * step as f64 / 200.0;

                let tile = project_to_tile((value, value), zoom);
                assert!(tile.x >= last_x, "x decreased at zoom {}", zoom);
                assert!(tile.y <= last_y, "y increased at zoom {}", zoom);
                last_x = tile.x;
                last_y = tile.y;
            }
        }
    }

    #[test]
    fn test_cache_key() {
        let coord = TileCoord::new(12, 655, 1407);
        assert_eq!(coord.cache_key(), "12/655/1407");
        assert_eq!(coord.to_string(), "12/655/1407");
    }

    #[test]
    fn test_validate_zoom() {
        assert!(validate_zoom(0).is_ok());
        assert!(validate_zoom(15).is_ok());
        assert!(matches!(
            validate_zoom(16),
            Err(TerrainError::InvalidZoom { zoom: 16, max: 15 })
        ));
    }
}
