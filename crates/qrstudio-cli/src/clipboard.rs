//! Clipboard transfer of generated images.

use anyhow::{Context, Result};
use arboard::Clipboard;
use qrstudio_core::RenderedImage;

/// Put the image on the clipboard as base64-encoded PNG text.
pub fn copy_base64_png(image: &RenderedImage) -> Result<usize> {
    let encoded = image.to_base64_png().context("Failed to encode PNG")?;

    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
    clipboard
        .set_text(encoded.as_str())
        .context("Failed to write to clipboard")?;

    log::debug!("Copied {} base64 characters to clipboard", encoded.len());
    Ok(encoded.len())
}
