//! Common test fixtures: terrarium-encoded tiles and bounding boxes.

use std::io::Cursor;

use image::{ImageOutputFormat, Rgb, RgbImage};

/// Edge length of a terrarium tile.
pub const TILE_PIXELS: u32 = 256;

/// Common EPSG:3857 bounding boxes for testing, as `(left, bottom, right, top)`.
pub mod bbox {
    /// 10 km square north-east of the origin; one column, two rows at zoom 10.
    pub const NEAR_ORIGIN: (f64, f64, f64, f64) = (0.0, 0.0, 10000.0, 10000.0);

    /// 200 km square centred on the origin; 2x2 tiles at zoom 8.
    pub const ORIGIN_2X2: (f64, f64, f64, f64) = (-100000.0, -100000.0, 100000.0, 100000.0);

    /// San Francisco bay area.
    pub const SF_BAY: (f64, f64, f64, f64) = (-13655000.0, 4530000.0, -13590000.0, 4580000.0);
}

/// Encode a height in meters as a terrarium RGB triplet.
///
/// Inverse of `R*256 + G + B/256 - 32768`, exact for multiples of 1/256 m.
pub fn encode_terrarium(height: f64) -> [u8; 3] {
    let value = (height + 32768.0).clamp(0.0, 65535.996);
    let whole = value.floor();
    let r = (whole / 256.0).floor() as u8;
    let g = (whole as u32 % 256) as u8;
    let b = ((value - whole) * 256.0).floor() as u8;
    [r, g, b]
}

/// Encode an RGB image as PNG bytes.
pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .expect("PNG encoding of a test image failed");
    cursor.into_inner()
}

/// A 256x256 PNG tile with every pixel set to `rgb`.
pub fn solid_tile_png(rgb: [u8; 3]) -> Vec<u8> {
    png_bytes(&RgbImage::from_pixel(TILE_PIXELS, TILE_PIXELS, Rgb(rgb)))
}

/// A 256x256 PNG tile of constant height.
pub fn flat_tile_png(height: f64) -> Vec<u8> {
    solid_tile_png(encode_terrarium(height))
}

/// A 256x256 PNG tile whose height is computed per `(row, col)`.
pub fn terrarium_tile_png(height_at: impl Fn(u32, u32) -> f64) -> Vec<u8> {
    let image = RgbImage::from_fn(TILE_PIXELS, TILE_PIXELS, |col, row| {
        Rgb(encode_terrarium(height_at(row, col)))
    });
    png_bytes(&image)
}
