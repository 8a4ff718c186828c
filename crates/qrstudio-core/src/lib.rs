//! QR Studio Core - Модуль генерации QR-кодов
//!
//! Библиотека для построения оформленных QR-кодов:
//! - Формирование содержимого (текст, URL, телефон, Wi-Fi, e-mail, vCard, PIX)
//! - Кодирование PIX BR Code (EMV) с откатом на текстовый шаблон
//! - Отрисовка с формой модулей, цветами, рамкой и логотипом
//! - Экспорт в PNG/JPEG и base64
//! - Обратное декодирование для проверки результата

pub mod content;
pub mod decoding;
pub mod export;
pub mod payment;
pub mod pix;
pub mod render;
pub mod style;

pub use content::{ContentKind, ContentRequest, PayloadFormatter, WifiSecurity};
pub use decoding::{DecodeError, DecodedQr, QrDecoder};
pub use export::{ExportError, ExportFormat};
pub use payment::{PaymentEncodeError, PaymentEncoder, PaymentRequest};
pub use pix::{BrCode, BrCodeError, PixEncoder};
pub use render::{LogoError, QrMatrix, QrRenderer, RenderError, RenderedImage};
pub use style::{
    Color, ErrorCorrectionLevel, LogoSource, ModuleShape, ParseValueError, StyleConfig, StyleError,
    MAX_IMAGE_SIZE,
};

use thiserror::Error;

/// Основные ошибки модуля
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("All content fields are empty")]
    EmptyRequest,

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Результат генерации
#[derive(Debug, Clone)]
pub struct Generated {
    /// Закодированная строка
    pub payload: String,
    /// Готовое изображение
    pub image: RenderedImage,
}

/// Главный генератор QR-кодов
pub struct QrStudio {
    formatter: PayloadFormatter,
    renderer: QrRenderer,
}

impl Default for QrStudio {
    fn default() -> Self {
        Self::new()
    }
}

impl QrStudio {
    /// Создание генератора с настройками по умолчанию
    pub fn new() -> Self {
        Self {
            formatter: PayloadFormatter::new(),
            renderer: QrRenderer::new(),
        }
    }

    /// Создание генератора с пользовательским формирователем содержимого
    pub fn with_formatter(formatter: PayloadFormatter) -> Self {
        Self {
            formatter,
            renderer: QrRenderer::new(),
        }
    }

    pub fn formatter(&self) -> &PayloadFormatter {
        &self.formatter
    }

    /// Строка для кодирования без отрисовки
    pub fn payload(&self, request: &ContentRequest) -> Result<String, StudioError> {
        if request.is_blank() {
            return Err(StudioError::EmptyRequest);
        }
        Ok(self.formatter.format(request))
    }

    /// Формирование содержимого и отрисовка
    pub fn generate(
        &self,
        request: &ContentRequest,
        style: &StyleConfig,
    ) -> Result<Generated, StudioError> {
        let payload = self.payload(request)?;
        log::info!("Generating {:?} QR, payload {} bytes", request.kind(), payload.len());

        let image = self.renderer.render(&payload, style)?;

        Ok(Generated { payload, image })
    }
}
