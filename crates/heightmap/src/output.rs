//! 16-bit grayscale raster serialization.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Luma};
use tracing::info;

use crate::error::{HeightmapError, HeightmapResult};
use crate::normalize::NormalizedRaster;

/// Container format of the output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Tiff,
    Png,
}

impl RasterFormat {
    /// Pick the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> HeightmapResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "tif" | "tiff" => Ok(RasterFormat::Tiff),
            "png" => Ok(RasterFormat::Png),
            _ => Err(HeightmapError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn image_format(self) -> ImageOutputFormat {
        match self {
            RasterFormat::Tiff => ImageOutputFormat::Tiff,
            RasterFormat::Png => ImageOutputFormat::Png,
        }
    }
}

fn to_image(raster: &NormalizedRaster) -> HeightmapResult<DynamicImage> {
    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(raster.width as u32, raster.height as u32, raster.data.clone())
            .ok_or_else(|| {
                HeightmapError::InvalidCrop(format!(
                    "{} values for a {}x{} raster",
                    raster.data.len(),
                    raster.width,
                    raster.height
                ))
            })?;
    Ok(DynamicImage::ImageLuma16(buffer))
}

/// Encode a raster into an in-memory file.
pub fn encode_raster(raster: &NormalizedRaster, format: RasterFormat) -> HeightmapResult<Vec<u8>> {
    let image = to_image(raster)?;
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, format.image_format())?;
    Ok(cursor.into_inner())
}

/// Write a raster to `path`, choosing the format from its extension.
pub fn write_raster(raster: &NormalizedRaster, path: &Path) -> HeightmapResult<()> {
    let format = RasterFormat::from_path(path)?;
    let bytes = encode_raster(raster, format)?;
    std::fs::write(path, &bytes)?;

    info!(
        path = %path.display(),
        width = raster.width,
        height = raster.height,
        bytes = bytes.len(),
        "Wrote elevation raster"
    );
    Ok(())
}
