//! Normalization to the 16-bit output range.

use heightmap::{
    encode_raster, normalize, write_raster, Canvas, HeightTile, NormalizedRaster, RasterFormat,
    OUTPUT_MAX,
};
use test_utils::{
    assert_approx_eq, create_constant_grid, create_elevation_ramp, create_ramp_with_spike,
};

/// Build a canvas from arbitrary row-major data, one 256x256 tile at a time.
fn canvas_from(width: usize, height: usize, data: &[f32]) -> Canvas {
    assert_eq!(width % 256, 0);
    assert_eq!(height % 256, 0);

    let mut canvas = Canvas::new(width, height);
    for tile_row in 0..height / 256 {
        for tile_col in 0..width / 256 {
            let mut block = Vec::with_capacity(256 * 256);
            for row in 0..256 {
                let start = (tile_row * 256 + row) * width + tile_col * 256;
                block.extend_from_slice(&data[start..start + 256]);
            }
            let tile = HeightTile::from_heights(block).unwrap();
            canvas
                .place_tile(tile_row * 256, tile_col * 256, &tile)
                .unwrap();
        }
    }
    canvas
}

#[test]
fn test_ramp_maps_extremes_to_full_range() {
    let data = create_elevation_ramp(256, 256, 100.0, 2100.0);
    let raster = normalize(&canvas_from(256, 256, &data));

    let bounds = raster.bounds.unwrap();
    assert_eq!(bounds.lower, 100.0);
    assert_eq!(bounds.upper, 2100.0);
    assert_eq!(raster.data[0], 0);
    assert_eq!(raster.data[raster.data.len() - 1], OUTPUT_MAX);
    assert!(raster.data.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_linear_scale_back_reproduces_elevations() {
    let data = create_elevation_ramp(256, 256, 0.0, 4000.0);
    let raster = normalize(&canvas_from(256, 256, &data));
    let bounds = raster.bounds.unwrap();

    let span = bounds.upper - bounds.lower;
    for (i, &value) in raster.data.iter().enumerate().step_by(997) {
        let restored = bounds.lower + value as f64 / OUTPUT_MAX as f64 * span;
        assert_approx_eq!(restored, data[i], span / OUTPUT_MAX as f64);
    }
}

#[test]
fn test_single_spike_does_not_stretch_range() {
    let (width, height) = (512, 256);
    let spike_index = 300 * 2 + 17;
    let data = create_ramp_with_spike(width, height, 0.0, 1000.0, spike_index, 1.0e6);
    let raster = normalize(&canvas_from(width, height, &data));

    let stats = raster.stats.unwrap();
    let bounds = raster.bounds.unwrap();
    assert_eq!(stats.max, 1.0e6);
    assert!(bounds.upper < 1001.0, "upper bound {}", bounds.upper);
    assert_eq!(bounds.lower, 0.0);

    assert_eq!(raster.data[spike_index], OUTPUT_MAX);

    // Mid-ramp stays near the middle of the output range.
    let mid = data.len() / 2;
    let expected = (data[mid] as f64 / bounds.upper * OUTPUT_MAX as f64).round();
    assert_approx_eq!(raster.data[mid], expected, 1.0);
}

#[test]
fn test_flat_canvas_normalizes_to_zero() {
    let data = create_constant_grid(256, 256, 512.0);
    let raster = normalize(&canvas_from(256, 256, &data));

    assert_eq!(raster.data.len(), 256 * 256);
    assert!(raster.data.iter().all(|&v| v == 0));
    let bounds = raster.bounds.unwrap();
    assert_eq!(bounds.lower, bounds.upper);
}

#[test]
fn test_normalize_after_crop() {
    let data = create_elevation_ramp(256, 256, 0.0, 65535.0);
    let canvas = canvas_from(256, 256, &data);
    let cropped = canvas
        .into_cropped(&terrain_common::PixelBounds {
            row_start: 10,
            row_end: 20,
            col_start: 0,
            col_end: 256,
        })
        .unwrap();

    let raster = normalize(&cropped);
    assert_eq!((raster.width, raster.height), (256, 10));
    assert_eq!(raster.get(0, 0), Some(0));
    assert_eq!(raster.get(9, 255), Some(OUTPUT_MAX));
}

fn small_raster() -> NormalizedRaster {
    NormalizedRaster {
        width: 3,
        height: 2,
        data: vec![0, 100, 1000, 30000, 60000, OUTPUT_MAX],
        bounds: None,
        stats: None,
    }
}

#[test]
fn test_png_keeps_sixteen_bits() {
    let bytes = encode_raster(&small_raster(), RasterFormat::Png).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    let luma = decoded.as_luma16().expect("16-bit grayscale");

    assert_eq!(luma.dimensions(), (3, 2));
    assert_eq!(luma.get_pixel(2, 0).0, [1000]);
    assert_eq!(luma.get_pixel(0, 1).0, [30000]);
    assert_eq!(luma.get_pixel(2, 1).0, [OUTPUT_MAX]);
}

#[test]
fn test_write_tiff_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("heightmap.tiff");
    write_raster(&small_raster(), &path).unwrap();

    let decoded = image::open(&path).unwrap();
    let luma = decoded.as_luma16().expect("16-bit grayscale");
    assert_eq!(luma.dimensions(), (3, 2));
    assert_eq!(luma.get_pixel(1, 1).0, [60000]);
}
