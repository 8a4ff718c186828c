//! Модуль декодирования QR-кодов
//!
//! Используется для проверки результата: изображение, построенное
//! отрисовщиком, должно читаться обратно в исходную строку.
//! Декодер - rqrr, с повторной попыткой на инвертированном изображении.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentKind;
use crate::render::RenderedImage;
use crate::style::ErrorCorrectionLevel;

/// Ошибки декодирования
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("No QR code found in image")]
    NotFound,

    #[error("Failed to decode QR: {0}")]
    DecodeFailed(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

/// Декодированный QR-код
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedQr {
    /// Декодированный текст
    pub content: String,
    /// Тип содержимого
    pub kind: ContentKind,
    /// Уровень коррекции ошибок
    pub error_correction: Option<ErrorCorrectionLevel>,
    /// Версия QR-кода (1-40)
    pub version: Option<u8>,
}

/// Декодер QR-кодов
pub struct QrDecoder {
    /// Попробовать инвертированное изображение
    try_inverted: bool,
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDecoder {
    /// Создание декодера
    pub fn new() -> Self {
        Self { try_inverted: true }
    }

    /// Декодер без попытки инверсии
    pub fn strict() -> Self {
        Self { try_inverted: false }
    }

    /// Декодирование QR-кода
    pub fn decode(&self, img: &GrayImage) -> Result<DecodedQr, DecodeError> {
        let first_error = match self.decode_with_rqrr(img) {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        // Светлые модули на тёмном фоне
        if self.try_inverted {
            log::debug!("FALLBACK: Trying inverted image...");
            let inverted = self.invert_image(img);
            if let Ok(result) = self.decode_with_rqrr(&inverted) {
                return Ok(result);
            }
        }

        Err(first_error)
    }

    /// Декодирование результата отрисовки
    pub fn decode_rendered(&self, rendered: &RenderedImage) -> Result<DecodedQr, DecodeError> {
        self.decode(&rendered.to_luma())
    }

    /// Декодирование изображения из байтов (PNG, JPEG)
    pub fn decode_bytes(&self, image_bytes: &[u8]) -> Result<DecodedQr, DecodeError> {
        let img = image::load_from_memory(image_bytes)
            .map_err(|e| DecodeError::InvalidImage(e.to_string()))?;
        self.decode(&img.to_luma8())
    }

    /// Декодирование через rqrr
    fn decode_with_rqrr(&self, img: &GrayImage) -> Result<DecodedQr, DecodeError> {
        let (width, height) = img.dimensions();
        log::debug!("RQRR: Starting detection on {}x{} image", width, height);

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| img.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        log::debug!("RQRR: Detected {} grids", grids.len());

        let mut last_error = DecodeError::NotFound;

        for grid in &grids {
            match grid.decode() {
                Ok((meta, content)) => {
                    // Значения поля формата: 0 - M, 1 - L, 2 - H, 3 - Q
                    let error_correction = match meta.ecc_level {
                        0 => Some(ErrorCorrectionLevel::M),
                        1 => Some(ErrorCorrectionLevel::L),
                        2 => Some(ErrorCorrectionLevel::H),
                        3 => Some(ErrorCorrectionLevel::Q),
                        _ => None,
                    };

                    return Ok(DecodedQr {
                        kind: ContentKind::detect(&content),
                        content,
                        error_correction,
                        version: u8::try_from(meta.version.0).ok(),
                    });
                }
                Err(e) => {
                    log::debug!("RQRR: Decode failed: {:?}", e);
                    last_error = DecodeError::DecodeFailed(format!("{:?}", e));
                }
            }
        }

        Err(last_error)
    }

    /// Инвертирование изображения
    fn invert_image(&self, img: &GrayImage) -> GrayImage {
        let mut result = img.clone();
        image::imageops::invert(&mut result);
        result
    }
}
