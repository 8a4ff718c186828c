//! Generator of a style gallery: every module shape at every error-correction level
//!
//! Usage: cargo run -p qrstudio-core --example gallery

use qrstudio_core::{Color, ErrorCorrectionLevel, ModuleShape, QrRenderer, StyleConfig};
use std::fs;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("generated_gallery");
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    println!("Generating gallery in {:?}", output_dir);

    let palettes = [
        ("classic", Color::BLACK, Color::WHITE),
        ("emerald", Color::rgb(6, 95, 70), Color::rgb(236, 253, 245)),
        ("night", Color::rgb(255, 255, 255), Color::rgb(17, 24, 39)),
    ];

    let renderer = QrRenderer::new();
    let mut count = 0;

    for (palette, foreground, background) in palettes {
        for shape in ModuleShape::ALL {
            for level in ErrorCorrectionLevel::ALL {
                let style = StyleConfig {
                    foreground,
                    background,
                    shape,
                    error_correction: level,
                    ..Default::default()
                };

                let image = renderer.render("https://github.com/your-org/qrstudio", &style)?;
                let name = format!("{}_{:?}_{}.png", palette, shape, level).to_lowercase();
                image.save(output_dir.join(name))?;
                count += 1;
            }
        }
    }

    println!("Generated {} images.", count);
    Ok(())
}
