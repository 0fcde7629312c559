//! The rectangular grid of tiles covering a bounding box.

use crate::bbox::BoundingBox;
use crate::error::{TerrainError, TerrainResult};
use crate::tile::{project_to_pixel, project_to_tile, validate_zoom, TileCoord, TILE_SIZE};

/// Crop window inside the stitched canvas, in pixels.
///
/// `row` is the vertical axis and `col` the horizontal one. Ends are
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl PixelBounds {
    pub fn width(&self) -> usize {
        self.col_end - self.col_start
    }

    pub fn height(&self) -> usize {
        self.row_end - self.row_start
    }
}

/// Tiles covering a bounding box at one zoom level.
///
/// Built once per run and read-only afterwards. Tiles are enumerated in
/// row-major order (rows `top..=bottom`, columns `left..=right`) and that
/// order defines the tile index used throughout the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    zoom: u32,
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
    /// Sub-tile pixel offsets of the box corners.
    left_px: f64,
    right_px: f64,
    top_px: f64,
    bottom_px: f64,
}

impl TileSet {
    /// Build the tile set covering `bbox` at `zoom`.
    ///
    /// The bottom-left corner yields the `left`/`bottom` tiles and the
    /// top-right corner the `right`/`top` tiles. Inputs are not validated;
    /// use [`TileSet::try_new`] for user-provided values.
    pub fn new(bbox: &BoundingBox, zoom: u32) -> Self {
        let bottom_left = project_to_tile(bbox.bottom_left(), zoom);
        let top_right = project_to_tile(bbox.top_right(), zoom);
        let (left_px, bottom_px) = project_to_pixel(bbox.bottom_left(), zoom);
        let (right_px, top_px) = project_to_pixel(bbox.top_right(), zoom);

        Self {
            zoom,
            left: bottom_left.x,
            right: top_right.x.max(bottom_left.x),
            top: top_right.y.min(bottom_left.y),
            bottom: bottom_left.y,
            left_px,
            right_px,
            top_px,
            bottom_px,
        }
    }

    /// Validate the inputs, then build the tile set.
    pub fn try_new(bbox: &BoundingBox, zoom: u32) -> TerrainResult<Self> {
        validate_zoom(zoom)?;
        bbox.validate()?;
        Ok(Self::new(bbox, zoom))
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn right(&self) -> u32 {
        self.right
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn bottom(&self) -> u32 {
        self.bottom
    }

    /// Number of tile columns.
    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    /// Number of tile rows.
    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }

    /// Total number of tiles in the set.
    pub fn count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// All tile coordinates in row-major order.
    pub fn tiles(&self) -> Vec<TileCoord> {
        let mut tiles = Vec::with_capacity(self.count());
        for y in self.top..=self.bottom {
            for x in self.left..=self.right {
                tiles.push(TileCoord::new(self.zoom, x, y));
            }
        }
        tiles
    }

    /// Row-major index of a tile, if it belongs to the set.
    pub fn tile_index(&self, coord: &TileCoord) -> Option<usize> {
        if coord.z != self.zoom
            || coord.x < self.left
            || coord.x > self.right
            || coord.y < self.top
            || coord.y > self.bottom
        {
            return None;
        }
        let row = (coord.y - self.top) as usize;
        let col = (coord.x - self.left) as usize;
        Some(row * self.width() as usize + col)
    }

    /// Tile coordinate at a row-major index.
    pub fn tile_at(&self, index: usize) -> Option<TileCoord> {
        if index >= self.count() {
            return None;
        }
        let width = self.width() as usize;
        let row = (index / width) as u32;
        let col = (index % width) as u32;
        Some(TileCoord::new(self.zoom, self.left + col, self.top + row))
    }

    /// Top-left canvas pixel `(row, col)` of the tile at `index`.
    pub fn pixel_origin(&self, index: usize) -> TerrainResult<(usize, usize)> {
        if index >= self.count() {
            return Err(TerrainError::TileIndexOutOfRange {
                index,
                count: self.count(),
            });
        }
        let width = self.width() as usize;
        let size = TILE_SIZE as usize;
        Ok(((index / width) * size, (index % width) * size))
    }

    /// Pre-crop canvas size as `(width, height)` in pixels.
    pub fn final_resolution(&self) -> (u32, u32) {
        (self.width() * TILE_SIZE, self.height() * TILE_SIZE)
    }

    /// Exact crop window of the requested box inside the stitched canvas.
    ///
    /// Partially covered edge pixels are kept, so every non-empty box maps to
    /// at least one pixel in each direction.
    pub fn pixel_bounds(&self) -> PixelBounds {
        let size = TILE_SIZE as f64;
        let (canvas_width, canvas_height) = self.final_resolution();

        let (col_start, col_end) = span(
            self.left_px,
            (self.width() - 1) as f64 * size + self.right_px,
            canvas_width as usize,
        );
        let (row_start, row_end) = span(
            self.top_px,
            (self.height() - 1) as f64 * size + self.bottom_px,
            canvas_height as usize,
        );

        PixelBounds {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }
}

fn span(start: f64, end: f64, limit: usize) -> (usize, usize) {
    let start = (start.floor().max(0.0) as usize).min(limit - 1);
    let end = (end.ceil().max(0.0) as usize).clamp(start + 1, limit);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_box_is_single_column() {
        let tileset = TileSet::new(&BoundingBox::new(0.0, 0.0, 10000.0, 10000.0), 10);

        assert_eq!(tileset.left(), 512);
        assert_eq!(tileset.right(), 512);
        assert_eq!(tileset.top(), 511);
        assert_eq!(tileset.bottom(), 512);
        assert_eq!(tileset.width(), 1);
        assert_eq!(tileset.height(), 2);
        assert_eq!(tileset.final_resolution(), (256, 512));
    }

    #[test]
    fn test_pixel_bounds_of_small_box() {
        let tileset = TileSet::new(&BoundingBox::new(0.0, 0.0, 10000.0, 10000.0), 10);
        let bounds = tileset.pixel_bounds();

        assert_eq!(bounds.col_start, 0);
        assert_eq!(bounds.col_end, 66);
        assert_eq!(bounds.row_start, 190);
        assert_eq!(bounds.row_end, 256);
        assert_eq!((bounds.width(), bounds.height()), (66, 66));
    }

    #[test]
    fn test_box_inside_one_tile() {
        let tileset = TileSet::new(&BoundingBox::new(100.0, 100.0, 200.0, 200.0), 3);
        assert_eq!(tileset.count(), 1);
        assert_eq!(tileset.tiles(), vec![TileCoord::new(3, 4, 3)]);

        let bounds = tileset.pixel_bounds();
        assert!(bounds.width() >= 1);
        assert!(bounds.height() >= 1);
    }

    #[test]
    fn test_pixel_origin() {
        let tileset = TileSet::new(&BoundingBox::new(-100000.0, -100000.0, 100000.0, 100000.0), 8);
        assert_eq!(tileset.width(), 2);
        assert_eq!(tileset.height(), 2);

        assert_eq!(tileset.pixel_origin(0).unwrap(), (0, 0));
        assert_eq!(tileset.pixel_origin(1).unwrap(), (0, 256));
        assert_eq!(tileset.pixel_origin(2).unwrap(), (256, 0));
        assert_eq!(tileset.pixel_origin(3).unwrap(), (256, 256));
        assert!(tileset.pixel_origin(4).is_err());
    }

    #[test]
    fn test_try_new_rejects_bad_input() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(TileSet::try_new(&bbox, 16).is_err());
        assert!(TileSet::try_new(&BoundingBox::new(10.0, 0.0, 0.0, 10.0), 5).is_err());
        assert!(TileSet::try_new(&bbox, 15).is_ok());
    }
}
