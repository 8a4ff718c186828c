use anyhow::{bail, Context, Result};
use qrstudio_core::{ContentRequest, QrDecoder, QrStudio, StyleConfig};

use crate::args::OutputArgs;
use crate::clipboard;

pub fn generate(request: &ContentRequest, style: &StyleConfig, output: &OutputArgs) -> Result<()> {
    let studio = QrStudio::new();
    let generated = studio
        .generate(request, style)
        .with_context(|| format!("Failed to generate {:?} QR code", request.kind()))?;

    if output.print_payload {
        println!("{}", generated.payload);
    }

    if output.verify {
        let decoded = QrDecoder::new()
            .decode_rendered(&generated.image)
            .context("Generated image does not decode")?;
        if decoded.content != generated.payload {
            bail!(
                "Decoded content differs from payload: {:?} != {:?}",
                decoded.content,
                generated.payload
            );
        }
        log::info!("Verified: {:?}", decoded.kind);
    }

    if let Some(path) = output.target() {
        generated
            .image
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        println!("Saved {}x{} QR code to {}", generated.image.width(), generated.image.height(), path.display());
    }

    if output.copy {
        let len = clipboard::copy_base64_png(&generated.image)?;
        println!("Copied PNG to clipboard ({} base64 chars)", len);
    }

    if let Some(path) = &output.save_preset {
        style
            .save(path)
            .with_context(|| format!("Failed to save preset {}", path.display()))?;
        log::info!("Preset written to {}", path.display());
    }

    Ok(())
}
