//! Terrarium elevation decoding.
//!
//! Heights are packed into the RGB channels of a PNG tile as
//! `R*256 + G + B/256 - 32768` meters. Negative results come from encoding
//! artifacts over the sea and are clamped to 0.

use terrain_common::TILE_SIZE;

use crate::error::{HeightmapError, HeightmapResult};

/// Offset applied by the terrarium encoding.
const TERRARIUM_OFFSET: f32 = 32768.0;

/// Decode one terrarium pixel into meters.
#[inline]
pub fn decode_pixel(rgb: [u8; 3]) -> f32 {
    let [r, g, b] = rgb;
    let height = r as f32 * 256.0 + g as f32 + b as f32 / 256.0 - TERRARIUM_OFFSET;
    height.max(0.0)
}

/// Decoded heights of one 256x256 tile, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightTile {
    data: Vec<f32>,
}

impl HeightTile {
    /// Wrap row-major heights; `data` must hold exactly 256x256 values.
    pub fn from_heights(data: Vec<f32>) -> HeightmapResult<Self> {
        let size = TILE_SIZE as usize;
        if data.len() != size * size {
            return Err(HeightmapError::TileLength {
                len: data.len(),
                expected: size * size,
            });
        }
        Ok(Self { data })
    }

    /// Edge length in pixels.
    pub fn size(&self) -> usize {
        TILE_SIZE as usize
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.size() + col]
    }

    /// One row of heights.
    pub fn row(&self, row: usize) -> &[f32] {
        let size = self.size();
        &self.data[row * size..(row + 1) * size]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Decode a PNG terrarium tile into heights.
pub fn decode_tile(png: &[u8]) -> HeightmapResult<HeightTile> {
    let image = image::load_from_memory(png)?.to_rgb8();
    let (width, height) = image.dimensions();
    if width != TILE_SIZE || height != TILE_SIZE {
        return Err(HeightmapError::TileSize {
            width,
            height,
            expected: TILE_SIZE,
        });
    }

    // RgbImage pixels are stored row by row, matching the canvas convention.
    let data = image.pixels().map(|pixel| decode_pixel(pixel.0)).collect();
    Ok(HeightTile { data })
}
