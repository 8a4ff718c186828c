//! Export of rendered QR images: files (PNG/JPEG), PNG bytes and base64 for the clipboard.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::RenderedImage;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Raster formats available for export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    /// Format from the file extension (`png`, `jpg`, `jpeg`)
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl RenderedImage {
    /// Encode into the given format. JPEG has no alpha channel, so it is dropped.
    pub fn encode(&self, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Cursor::new(Vec::new());

        match format {
            ExportFormat::Png => self.image.write_to(&mut buffer, ImageFormat::Png)?,
            ExportFormat::Jpeg => DynamicImage::ImageRgba8(self.image.clone())
                .to_rgb8()
                .write_to(&mut buffer, ImageFormat::Jpeg)?,
        }

        Ok(buffer.into_inner())
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ExportError> {
        self.encode(ExportFormat::Png)
    }

    /// PNG bytes as standard base64, ready for clipboard transfer
    pub fn to_base64_png(&self) -> Result<String, ExportError> {
        let png = self.to_png_bytes()?;
        Ok(base64::engine::general_purpose::STANDARD.encode(png))
    }

    /// Save to disk; the format follows the extension.
    /// Nothing is written if encoding fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        let format = ExportFormat::from_path(path)?;
        let bytes = self.encode(format)?;
        std::fs::write(path, bytes)?;
        log::info!("Saved QR image to {}", path.display());
        Ok(())
    }
}
