//! Output size estimates per zoom level.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use indicatif::BinaryBytes;
use terrain_common::{BoundingBox, TileSet};

/// Zoom levels listed in the estimate table.
pub const ESTIMATE_ZOOMS: std::ops::RangeInclusive<u32> = 7..=15;

/// Bytes per output pixel (16-bit grayscale).
const BYTES_PER_PIXEL: u64 = 2;

/// Size of the download at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomEstimate {
    pub zoom: u32,
    pub tiles: usize,
    /// Pre-crop canvas size `(width, height)`.
    pub resolution: (u32, u32),
    pub output_bytes: u64,
}

impl ZoomEstimate {
    pub fn for_zoom(bbox: &BoundingBox, zoom: u32) -> Self {
        let tileset = TileSet::new(bbox, zoom);
        let resolution = tileset.final_resolution();
        Self {
            zoom,
            tiles: tileset.count(),
            resolution,
            output_bytes: resolution.0 as u64 * resolution.1 as u64 * BYTES_PER_PIXEL,
        }
    }
}

/// Estimates for every zoom in [`ESTIMATE_ZOOMS`].
pub fn estimate(bbox: &BoundingBox) -> Vec<ZoomEstimate> {
    ESTIMATE_ZOOMS
        .map(|zoom| ZoomEstimate::for_zoom(bbox, zoom))
        .collect()
}

/// Render the estimate table.
pub fn render_table(estimates: &[ZoomEstimate]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Zoom", "Tiles", "Resolution", "Estimated size"]);

    for e in estimates {
        table.add_row(vec![
            e.zoom.to_string(),
            e.tiles.to_string(),
            format!("{}x{}", e.resolution.0, e.resolution.1),
            BinaryBytes(e.output_bytes).to_string(),
        ]);
    }
    table
}
