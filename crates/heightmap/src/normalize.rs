//! Robust rescaling of elevations to the 16-bit output range.
//!
//! The output range is bounded by the 0.005th and 99.995th percentiles
//! unless the true extreme lies within one standard deviation of the
//! percentile, in which case the true extreme is used. A single corrupt
//! pixel therefore cannot stretch the scale of the whole raster.

use tracing::debug;

use crate::canvas::Canvas;

/// Largest output value.
pub const OUTPUT_MAX: u16 = u16::MAX;

/// Percentile used as the robust lower bound.
pub const LOWER_PERCENTILE: f64 = 0.005;

/// Percentile used as the robust upper bound.
pub const UPPER_PERCENTILE: f64 = 99.995;

/// Summary statistics over all elevations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationStats {
    pub min: f64,
    pub max: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min_window: f64,
    pub max_window: f64,
}

impl ElevationStats {
    /// Compute the statistics, `None` for an empty input.
    pub fn compute(values: &[f32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_unstable_by(f32::total_cmp);

        let count = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / count;
        let variance = values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / count;

        Some(Self {
            min: sorted[0] as f64,
            max: sorted[sorted.len() - 1] as f64,
            std_dev: variance.sqrt(),
            min_window: percentile(&sorted, LOWER_PERCENTILE),
            max_window: percentile(&sorted, UPPER_PERCENTILE),
        })
    }

    /// Pick the bounds used for rescaling.
    pub fn bounds(&self) -> NormalizationBounds {
        let lower = if (self.min - self.min_window).abs() <= self.std_dev {
            self.min
        } else {
            self.min_window
        };
        let upper = if (self.max - self.max_window).abs() <= self.std_dev {
            self.max
        } else {
            self.max_window
        };
        NormalizationBounds { lower, upper }
    }
}

/// Linear-interpolated percentile of sorted data, `p` in `[0, 100]`.
pub fn percentile(sorted: &[f32], p: f64) -> f64 {
    let last = sorted.len() - 1;
    let position = (p / 100.0).clamp(0.0, 1.0) * last as f64;
    let lo = position.floor() as usize;
    let hi = (lo + 1).min(last);
    let fraction = position - lo as f64;

    let a = sorted[lo] as f64;
    let b = sorted[hi] as f64;
    a + (b - a) * fraction
}

/// Elevations mapped onto `0` and [`OUTPUT_MAX`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationBounds {
    pub lower: f64,
    pub upper: f64,
}

impl NormalizationBounds {
    /// Map one elevation to the output range.
    ///
    /// A degenerate range (flat terrain) maps everything to 0.
    #[inline]
    pub fn scale(&self, value: f32) -> u16 {
        let span = self.upper - self.lower;
        if span <= 0.0 || !span.is_finite() {
            return 0;
        }
        let unit = ((value as f64 - self.lower) / span).clamp(0.0, 1.0);
        (unit * OUTPUT_MAX as f64).round() as u16
    }
}

/// A normalized 16-bit raster.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRaster {
    pub width: usize,
    pub height: usize,
    /// Row-major output values.
    pub data: Vec<u16>,
    /// Bounds that were mapped to 0 and [`OUTPUT_MAX`], `None` when empty.
    pub bounds: Option<NormalizationBounds>,
    pub stats: Option<ElevationStats>,
}

impl NormalizedRaster {
    pub fn get(&self, row: usize, col: usize) -> Option<u16> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.data[row * self.width + col])
    }
}

/// Normalize a canvas to the full `u16` range.
pub fn normalize(canvas: &Canvas) -> NormalizedRaster {
    let stats = ElevationStats::compute(canvas.data());
    let bounds = stats.map(|s| s.bounds());

    let data = match bounds {
        Some(bounds) => canvas.data().iter().map(|&v| bounds.scale(v)).collect(),
        None => Vec::new(),
    };

    if let (Some(stats), Some(bounds)) = (stats, bounds) {
        debug!(
            min = stats.min,
            max = stats.max,
            std_dev = stats.std_dev,
            lower = bounds.lower,
            upper = bounds.upper,
            "Normalized elevations"
        );
    }

    NormalizedRaster {
        width: canvas.width(),
        height: canvas.height(),
        data,
        bounds,
        stats,
    }
}
