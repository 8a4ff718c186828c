use anyhow::{Context, Result};
use qrstudio_core::{BrCode, ContentKind, QrDecoder};
use std::fs;
use std::path::Path;

pub fn decode_image(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let decoded = QrDecoder::new()
        .decode_bytes(&bytes)
        .with_context(|| format!("No QR code read from {}", path.display()))?;

    println!("{}", decoded.content);
    println!("  kind: {:?}", decoded.kind);
    if let Some(level) = decoded.error_correction {
        println!("  error correction: {}", level);
    }
    if let Some(version) = decoded.version {
        println!("  version: {}", version);
    }

    if decoded.kind == ContentKind::PaymentKey {
        match BrCode::parse(&decoded.content) {
            Ok(code) => {
                if let Some(key) = code.pix_key() {
                    println!("  pix key: {}", key);
                }
                if let Some(name) = &code.merchant_name {
                    println!("  name: {}", name);
                }
                if let Some(city) = &code.merchant_city {
                    println!("  city: {}", city);
                }
                if let Some(amount) = &code.transaction_amount {
                    println!("  amount: {}", amount);
                }
                if let Some(txid) = code.txid() {
                    println!("  txid: {}", txid);
                }
            }
            Err(e) => log::debug!("Not a BR Code ({}), showing raw text only", e),
        }
    }

    Ok(())
}
