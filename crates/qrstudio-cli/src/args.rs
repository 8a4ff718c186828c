//! Style and output flags shared by every generate command.

use anyhow::Context;
use clap::Args;
use qrstudio_core::{Color, ErrorCorrectionLevel, LogoSource, ModuleShape, StyleConfig};
use std::path::PathBuf;

/// Styling. Flags override the preset, the preset overrides the defaults.
#[derive(Args, Debug, Default)]
pub struct StyleArgs {
    /// JSON style preset to start from
    #[arg(long, global = true)]
    pub preset: Option<PathBuf>,

    /// Output image size in pixels
    #[arg(long, global = true)]
    pub size: Option<u32>,

    /// Module color (#RRGGBB, #RGB or r,g,b)
    #[arg(long = "fg", global = true)]
    pub foreground: Option<Color>,

    /// Background color
    #[arg(long = "bg", global = true)]
    pub background: Option<Color>,

    /// square, gapped, circle or rounded
    #[arg(long, global = true)]
    pub shape: Option<ModuleShape>,

    /// Quiet zone width in modules
    #[arg(long, global = true)]
    pub border: Option<u32>,

    /// Error correction level: L, M, Q or H
    #[arg(long = "ec", global = true)]
    pub error_correction: Option<ErrorCorrectionLevel>,

    /// Pixels per module before the final resize
    #[arg(long, global = true)]
    pub box_size: Option<u32>,

    /// Logo image placed at the center
    #[arg(long, global = true)]
    pub logo: Option<PathBuf>,

    /// Keep the logo at its original size
    #[arg(long, global = true)]
    pub no_logo_resize: bool,
}

impl StyleArgs {
    pub fn resolve(&self) -> anyhow::Result<StyleConfig> {
        let mut style = match &self.preset {
            Some(path) => StyleConfig::load(path)
                .with_context(|| format!("Failed to load preset {}", path.display()))?,
            None => StyleConfig::default(),
        };

        if let Some(size) = self.size {
            style.size = size;
        }
        if let Some(color) = self.foreground {
            style.foreground = color;
        }
        if let Some(color) = self.background {
            style.background = color;
        }
        if let Some(shape) = self.shape {
            style.shape = shape;
        }
        if let Some(border) = self.border {
            style.border = border;
        }
        if let Some(level) = self.error_correction {
            style.error_correction = level;
        }
        if let Some(box_size) = self.box_size {
            style.box_size = box_size;
        }
        if let Some(logo) = &self.logo {
            style.logo = Some(LogoSource::Path(logo.clone()));
        }
        if self.no_logo_resize {
            style.auto_resize_logo = false;
        }

        style.validate().context("Invalid style")?;
        Ok(style)
    }
}

/// What to do with the generated image
#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// Save to this file (.png, .jpg); defaults to qrcode.png unless --copy is given
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Copy the PNG to the clipboard as base64 text
    #[arg(long, global = true)]
    pub copy: bool,

    /// Print the encoded payload
    #[arg(long, global = true)]
    pub print_payload: bool,

    /// Decode the result and fail if it does not read back
    #[arg(long, global = true)]
    pub verify: bool,

    /// Write the effective style as a JSON preset
    #[arg(long, global = true)]
    pub save_preset: Option<PathBuf>,
}

impl OutputArgs {
    /// Target file, if any
    pub fn target(&self) -> Option<PathBuf> {
        match (&self.output, self.copy) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => None,
            (None, false) => Some(PathBuf::from("qrcode.png")),
        }
    }
}
