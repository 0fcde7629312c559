//! The stitched elevation canvas.
//!
//! Row-major `f32` heights, zero-initialized. `row` is always the vertical
//! pixel axis and `col` the horizontal one, for tile placement and cropping
//! alike.

use terrain_common::{PixelBounds, TileSet};

use crate::error::{HeightmapError, HeightmapResult};
use crate::terrarium::HeightTile;

/// 2-D grid of elevations in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Canvas {
    /// Allocate a zero-filled canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Allocate a canvas the size of the full tile grid.
    pub fn for_tileset(tileset: &TileSet) -> Self {
        let (width, height) = tileset.final_resolution();
        Self::new(width as usize, height as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.data[row * self.width + col])
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Copy a decoded tile into the block whose top-left pixel is
    /// `(row, col)`.
    pub fn place_tile(&mut self, row: usize, col: usize, tile: &HeightTile) -> HeightmapResult<()> {
        let size = tile.size();
        if row + size > self.height || col + size > self.width {
            return Err(HeightmapError::OutOfCanvas {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }

        for tile_row in 0..size {
            let start = (row + tile_row) * self.width + col;
            self.data[start..start + size].copy_from_slice(tile.row(tile_row));
        }
        Ok(())
    }

    /// Cut the canvas down to `bounds`, consuming it.
    pub fn into_cropped(self, bounds: &PixelBounds) -> HeightmapResult<Canvas> {
        if bounds.row_start >= bounds.row_end
            || bounds.col_start >= bounds.col_end
            || bounds.row_end > self.height
            || bounds.col_end > self.width
        {
            return Err(HeightmapError::InvalidCrop(format!("{:?}", bounds)));
        }

        if bounds.width() == self.width && bounds.height() == self.height {
            return Ok(self);
        }

        let mut data = Vec::with_capacity(bounds.width() * bounds.height());
        for row in bounds.row_start..bounds.row_end {
            let start = row * self.width;
            data.extend_from_slice(&self.data[start + bounds.col_start..start + bounds.col_end]);
        }

        Ok(Canvas {
            width: bounds.width(),
            height: bounds.height(),
            data,
        })
    }
}
