//! Модуль отрисовки QR-кодов
//!
//! Этапы:
//! 1. Кодирование строки в матрицу модулей (крейт `qrcode`)
//! 2. Отрисовка модулей выбранной формой в двух цветах
//! 3. Ресайз до целевого размера (Lanczos3)
//! 4. Наложение логотипа по центру (ошибки логотипа не фатальны)

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use qrcode::{QrCode, Version};
use thiserror::Error;

use crate::style::{ErrorCorrectionLevel, LogoSource, ModuleShape, StyleConfig, StyleError};

/// Доля ширины изображения, которую занимает логотип
const LOGO_SCALE: f32 = 0.20;
/// Доля модуля, закрашиваемая в форме GappedSquare
const GAP_RATIO: f32 = 0.8;
/// Размер finder pattern в модулях
const FINDER_SIZE: usize = 7;

/// Ошибки отрисовки
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to encode payload: {0}")]
    Encoding(#[from] qrcode::types::QrError),

    #[error("Invalid style: {0}")]
    InvalidStyle(#[from] StyleError),
}

/// Ошибки загрузки логотипа
#[derive(Error, Debug)]
pub enum LogoError {
    #[error("Failed to read logo: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode logo: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Logo {width}x{height} does not fit into {canvas}x{canvas} image")]
    TooLarge { width: u32, height: u32, canvas: u32 },
}

/// Матрица модулей QR-кода
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    modules: Vec<bool>,
    version: i16,
    error_correction: ErrorCorrectionLevel,
}

impl QrMatrix {
    /// Кодирование строки; версия подбирается автоматически (минимальная подходящая)
    pub fn encode(payload: &str, level: ErrorCorrectionLevel) -> Result<Self, RenderError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), level.into())?;

        let version = match code.version() {
            Version::Normal(v) | Version::Micro(v) => v,
        };
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();

        Ok(Self {
            width: code.width(),
            modules,
            version,
            error_correction: level,
        })
    }

    /// Ширина в модулях (без рамки)
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn version(&self) -> i16 {
        self.version
    }

    pub fn error_correction(&self) -> ErrorCorrectionLevel {
        self.error_correction
    }

    /// Тёмный ли модуль; за пределами матрицы всегда светлый
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Инвертирование модуля (имитация повреждения)
    pub fn toggle(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.width {
            let idx = y * self.width + x;
            self.modules[idx] = !self.modules[idx];
        }
    }

    /// Принадлежит ли модуль одному из трёх finder pattern
    pub fn is_finder(&self, x: usize, y: usize) -> bool {
        let far = self.width.saturating_sub(FINDER_SIZE);
        let left = x < FINDER_SIZE;
        let top = y < FINDER_SIZE;
        (left && top) || (x >= far && top) || (left && y >= far)
    }

    fn neighbour(&self, x: usize, y: usize, dx: isize, dy: isize) -> bool {
        match (x.checked_add_signed(dx), y.checked_add_signed(dy)) {
            (Some(nx), Some(ny)) => self.is_dark(nx, ny),
            _ => false,
        }
    }
}

/// Готовое изображение QR-кода (RGBA)
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub(crate) image: RgbaImage,
}

impl RenderedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    /// Градации серого (для декодирования)
    pub fn to_luma(&self) -> GrayImage {
        DynamicImage::ImageRgba8(self.image.clone()).to_luma8()
    }
}

impl From<RenderedImage> for DynamicImage {
    fn from(rendered: RenderedImage) -> Self {
        DynamicImage::ImageRgba8(rendered.image)
    }
}

/// Отрисовщик QR-кодов
#[derive(Debug, Clone, Copy, Default)]
pub struct QrRenderer;

impl QrRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Полный цикл: кодирование, отрисовка, ресайз, логотип
    pub fn render(&self, payload: &str, style: &StyleConfig) -> Result<RenderedImage, RenderError> {
        style.validate()?;

        let matrix = QrMatrix::encode(payload, style.error_correction)?;
        log::debug!(
            "Encoded {} bytes: version {}, {}x{} modules, level {}",
            payload.len(),
            matrix.version(),
            matrix.width(),
            matrix.width(),
            matrix.error_correction()
        );

        self.render_matrix(&matrix, style)
    }

    /// Отрисовка уже закодированной матрицы
    pub fn render_matrix(
        &self,
        matrix: &QrMatrix,
        style: &StyleConfig,
    ) -> Result<RenderedImage, RenderError> {
        style.validate()?;

        let canvas = self.draw_modules(matrix, style)?;

        let mut image = if canvas.dimensions() == (style.size, style.size) {
            canvas
        } else {
            imageops::resize(&canvas, style.size, style.size, FilterType::Lanczos3)
        };

        if let Some(source) = &style.logo {
            self.apply_logo(&mut image, source, style.auto_resize_logo);
        }

        log::info!(
            "Rendered QR {}x{} ({:?}, level {})",
            image.width(),
            image.height(),
            style.shape,
            style.error_correction
        );

        Ok(RenderedImage { image })
    }

    /// Отрисовка модулей на холсте `(width + 2 * border) * box_size`
    fn draw_modules(&self, matrix: &QrMatrix, style: &StyleConfig) -> Result<RgbaImage, StyleError> {
        let box_size = style.box_size;
        let side = style.canvas_side(matrix.width())?;
        let foreground = style.foreground.to_rgba();

        let mut canvas = RgbaImage::from_pixel(side, side, style.background.to_rgba());

        for y in 0..matrix.width() {
            for x in 0..matrix.width() {
                if !matrix.is_dark(x, y) {
                    continue;
                }

                let left = (x as u32 + style.border) * box_size;
                let top = (y as u32 + style.border) * box_size;

                // Finder pattern всегда квадратные, иначе их плохо находят сканеры
                let shape = if matrix.is_finder(x, y) {
                    ModuleShape::Square
                } else {
                    style.shape
                };

                match shape {
                    ModuleShape::Square => {
                        fill_square(&mut canvas, left, top, box_size, foreground);
                    }
                    ModuleShape::GappedSquare => {
                        let inner = ((box_size as f32 * GAP_RATIO).round() as u32).max(1);
                        let offset = (box_size - inner) / 2;
                        fill_square(&mut canvas, left + offset, top + offset, inner, foreground);
                    }
                    ModuleShape::Circle => {
                        fill_rounded(&mut canvas, left, top, box_size, [true; 4], foreground);
                    }
                    ModuleShape::Rounded => {
                        let north = matrix.neighbour(x, y, 0, -1);
                        let south = matrix.neighbour(x, y, 0, 1);
                        let west = matrix.neighbour(x, y, -1, 0);
                        let east = matrix.neighbour(x, y, 1, 0);

                        // Угол скругляется, только если обе соседние стороны пустые
                        let corners = [
                            !north && !west,
                            !north && !east,
                            !south && !west,
                            !south && !east,
                        ];
                        fill_rounded(&mut canvas, left, top, box_size, corners, foreground);
                    }
                }
            }
        }

        Ok(canvas)
    }

    /// Наложение логотипа. Любая ошибка логируется, QR остаётся без логотипа.
    fn apply_logo(&self, image: &mut RgbaImage, source: &LogoSource, auto_resize: bool) {
        match self.load_logo(source, image.width(), auto_resize) {
            Ok(logo) => {
                let x = (image.width() - logo.width()) / 2;
                let y = (image.height() - logo.height()) / 2;
                imageops::overlay(image, &logo, x as i64, y as i64);
                log::debug!("Logo {}x{} composited at ({}, {})", logo.width(), logo.height(), x, y);
            }
            Err(e) => {
                log::warn!("Logo skipped: {}", e);
            }
        }
    }

    fn load_logo(
        &self,
        source: &LogoSource,
        canvas: u32,
        auto_resize: bool,
    ) -> Result<RgbaImage, LogoError> {
        let bytes: Cow<'_, [u8]> = match source {
            LogoSource::Path(path) => Cow::Owned(std::fs::read(path)?),
            LogoSource::Bytes(bytes) => Cow::Borrowed(bytes),
        };

        let mut logo = image::load_from_memory(&bytes)?.to_rgba8();

        if auto_resize {
            let side = ((canvas as f32 * LOGO_SCALE) as u32).max(1);
            logo = imageops::resize(&logo, side, side, FilterType::Lanczos3);
        }

        if logo.width() > canvas || logo.height() > canvas {
            return Err(LogoError::TooLarge {
                width: logo.width(),
                height: logo.height(),
                canvas,
            });
        }

        Ok(logo)
    }
}

fn fill_square(canvas: &mut RgbaImage, left: u32, top: u32, side: u32, color: Rgba<u8>) {
    draw_filled_rect_mut(
        canvas,
        Rect::at(left as i32, top as i32).of_size(side, side),
        color,
    );
}

/// Модуль с выборочно скруглёнными четвертями: [nw, ne, sw, se].
/// Скруглённая четверть - сектор круга радиусом `side / 2` с центром в середине модуля.
fn fill_rounded(
    canvas: &mut RgbaImage,
    left: u32,
    top: u32,
    side: u32,
    rounded: [bool; 4],
    color: Rgba<u8>,
) {
    let half = side as f32 / 2.0;
    let radius_sq = half * half;

    for dy in 0..side {
        for dx in 0..side {
            let fx = dx as f32 + 0.5 - half;
            let fy = dy as f32 + 0.5 - half;

            let quarter = match (fx < 0.0, fy < 0.0) {
                (true, true) => 0,
                (false, true) => 1,
                (true, false) => 2,
                (false, false) => 3,
            };

            if rounded[quarter] && fx * fx + fy * fy > radius_sq {
                continue;
            }

            canvas.put_pixel(left + dx, top + dy, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    fn unscaled(shape: ModuleShape) -> StyleConfig {
        // 21 модуль + 2 * 4 рамки = 29; 29 * 10 = 290 -> без ресайза
        StyleConfig {
            size: 290,
            shape,
            error_correction: ErrorCorrectionLevel::L,
            ..Default::default()
        }
    }

    #[test]
    fn test_matrix_encoding() {
        let matrix = QrMatrix::encode("HELLO", ErrorCorrectionLevel::L).unwrap();
        assert_eq!(matrix.version(), 1);
        assert_eq!(matrix.width(), 21);

        // Углы finder pattern всегда тёмные
        assert!(matrix.is_dark(0, 0));
        assert!(matrix.is_dark(20, 0));
        assert!(matrix.is_dark(0, 20));
        assert!(!matrix.is_dark(21, 0));

        assert!(matrix.is_finder(6, 6));
        assert!(matrix.is_finder(14, 0));
        assert!(!matrix.is_finder(14, 14));
    }

    #[test]
    fn test_level_grows_version() {
        let payload = "https://example.com/some/longer/path?with=query&and=more";
        let low = QrMatrix::encode(payload, ErrorCorrectionLevel::L).unwrap();
        let high = QrMatrix::encode(payload, ErrorCorrectionLevel::H).unwrap();
        assert!(high.version() > low.version());
    }

    #[test]
    fn test_toggle() {
        let mut matrix = QrMatrix::encode("HELLO", ErrorCorrectionLevel::L).unwrap();
        let before = matrix.is_dark(10, 10);
        matrix.toggle(10, 10);
        assert_eq!(matrix.is_dark(10, 10), !before);
        matrix.toggle(100, 100);
    }

    #[test]
    fn test_payload_too_large() {
        let payload = "x".repeat(4000);
        let result = QrRenderer::new().render(&payload, &StyleConfig::default());
        assert!(matches!(result, Err(RenderError::Encoding(_))));
    }

    #[test]
    fn test_invalid_style() {
        let style = StyleConfig { size: 0, ..Default::default() };
        let result = QrRenderer::new().render("HELLO", &style);
        assert!(matches!(result, Err(RenderError::InvalidStyle(StyleError::ZeroSize))));
    }

    #[test]
    fn test_oversized_style_rejected() {
        let renderer = QrRenderer::new();

        let huge_border = StyleConfig { border: u32::MAX / 2 + 1, ..Default::default() };
        assert!(matches!(
            renderer.render("HELLO", &huge_border),
            Err(RenderError::InvalidStyle(StyleError::TooLarge { .. }))
        ));

        let preset = StyleConfig::from_json(r#"{"border": 3000000000}"#).unwrap();
        assert!(matches!(
            renderer.render("HELLO", &preset),
            Err(RenderError::InvalidStyle(StyleError::TooLarge { .. }))
        ));

        let huge_box = StyleConfig { box_size: 100_000, ..Default::default() };
        assert!(renderer.render("HELLO", &huge_box).is_err());

        let huge_size = StyleConfig { size: 100_000, ..Default::default() };
        assert!(renderer.render("HELLO", &huge_size).is_err());

        // Каждое поле в пределах, холст - нет
        let wide = StyleConfig { border: 1000, box_size: 100, ..Default::default() };
        assert!(matches!(
            renderer.render("HELLO", &wide),
            Err(RenderError::InvalidStyle(StyleError::TooLarge { what: "canvas", .. }))
        ));
    }

    #[test]
    fn test_canvas_layout() {
        let style = StyleConfig {
            foreground: Color::rgb(200, 0, 0),
            background: Color::rgb(0, 0, 200),
            ..unscaled(ModuleShape::Square)
        };
        let image = QrRenderer::new().render("HELLO", &style).unwrap();
        assert_eq!((image.width(), image.height()), (290, 290));

        let rgba = image.as_rgba();
        // Рамка - цвет фона, левый верхний finder - цвет модулей
        assert_eq!(*rgba.get_pixel(5, 5), Rgba([0, 0, 200, 255]));
        assert_eq!(*rgba.get_pixel(45, 45), Rgba([200, 0, 0, 255]));
    }

    #[test]
    fn test_shapes_cover_less_than_square() {
        let renderer = QrRenderer::new();
        let dark_pixels = |shape| {
            let image = renderer.render("HELLO", &unscaled(shape)).unwrap();
            image.as_rgba().pixels().filter(|p| p.0[0] < 128).count()
        };

        let square = dark_pixels(ModuleShape::Square);
        assert!(dark_pixels(ModuleShape::GappedSquare) < square);
        assert!(dark_pixels(ModuleShape::Circle) < square);
        assert!(dark_pixels(ModuleShape::Rounded) < square);
        assert!(dark_pixels(ModuleShape::Circle) < dark_pixels(ModuleShape::Rounded));
    }

    #[test]
    fn test_fill_rounded_corners() {
        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let black = Rgba([0, 0, 0, 255]);

        // Скруглён только северо-западный угол
        fill_rounded(&mut canvas, 0, 0, 10, [true, false, false, false], black);
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*canvas.get_pixel(9, 0), black);
        assert_eq!(*canvas.get_pixel(0, 9), black);
        assert_eq!(*canvas.get_pixel(9, 9), black);
        assert_eq!(*canvas.get_pixel(5, 5), black);
    }

    #[test]
    fn test_resize_to_target() {
        let style = StyleConfig { size: 123, ..Default::default() };
        let image = QrRenderer::new().render("resize me", &style).unwrap();
        assert_eq!((image.width(), image.height()), (123, 123));
    }
}
