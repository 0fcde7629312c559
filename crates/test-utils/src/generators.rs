//! Test data generators for creating synthetic elevation data.
//!
//! These generators create predictable, verifiable grids that can be used
//! across the test suite. All grids are row-major (row 0 first).

/// Creates an elevation ramp rising linearly from `low` (first cell) to
/// `high` (last cell) in row-major order.
pub fn create_elevation_ramp(width: usize, height: usize, low: f32, high: f32) -> Vec<f32> {
    let count = width * height;
    let last = count.saturating_sub(1).max(1) as f32;
    (0..count)
        .map(|i| low + (high - low) * i as f32 / last)
        .collect()
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates an elevation ramp with a single extreme spike at `spike_index`.
///
/// Useful for checking that one corrupt pixel does not stretch the output
/// range.
pub fn create_ramp_with_spike(
    width: usize,
    height: usize,
    low: f32,
    high: f32,
    spike_index: usize,
    spike: f32,
) -> Vec<f32> {
    let mut data = create_elevation_ramp(width, height, low, high);
    if let Some(cell) = data.get_mut(spike_index) {
        *cell = spike;
    }
    data
}
