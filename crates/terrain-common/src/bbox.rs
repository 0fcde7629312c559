//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};
use crate::tile::EARTH_HALF_CIRCUMFERENCE;

/// A projected EPSG:3857 bounding box, in meters.
///
/// Field order follows the input convention `left,bottom,right,top`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Parse a bounding box string: "left,bottom,right,top".
    ///
    /// Whitespace around each number is tolerated since the value is usually
    /// pasted from a web tool.
    pub fn parse(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let number = |part: &str| -> Result<f64, BboxParseError> {
            part.parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))
        };

        Ok(Self {
            left: number(parts[0])?,
            bottom: number(parts[1])?,
            right: number(parts[2])?,
            top: number(parts[3])?,
        })
    }

    /// Width of the bounding box in meters.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height of the bounding box in meters.
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// The bottom-left corner as an `(x, y)` pair.
    pub fn bottom_left(&self) -> (f64, f64) {
        (self.left, self.bottom)
    }

    /// The top-right corner as an `(x, y)` pair.
    pub fn top_right(&self) -> (f64, f64) {
        (self.right, self.top)
    }

    /// Check that the box is non-degenerate and inside the Web Mercator extent.
    pub fn validate(&self) -> TerrainResult<()> {
        let values = [self.left, self.bottom, self.right, self.top];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TerrainError::InvalidBbox(format!(
                "non-finite coordinate in {:?}",
                values
            )));
        }
        if self.right <= self.left {
            return Err(TerrainError::InvalidBbox(format!(
                "right ({}) must be greater than left ({})",
                self.right, self.left
            )));
        }
        if self.top <= self.bottom {
            return Err(TerrainError::InvalidBbox(format!(
                "top ({}) must be greater than bottom ({})",
                self.top, self.bottom
            )));
        }

        let extent = EARTH_HALF_CIRCUMFERENCE;
        if values.iter().any(|v| v.abs() > extent) {
            return Err(TerrainError::InvalidBbox(format!(
                "coordinates must lie within +/-{} meters",
                extent
            )));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'left,bottom,right,top'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),
}
