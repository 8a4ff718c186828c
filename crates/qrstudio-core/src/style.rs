//! Модуль настроек оформления QR-кода
//!
//! Описывает всё, что влияет на внешний вид результата:
//! - размер итогового изображения и размер модуля (box size)
//! - цвета модулей и фона
//! - форма модулей
//! - уровень коррекции ошибок
//! - логотип в центре
//!
//! `StyleConfig` сериализуется в JSON и используется как пресет.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::Rgba;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибка разбора строкового значения (цвет, форма, уровень коррекции)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {what}: {value:?}")]
pub struct ParseValueError {
    pub what: &'static str,
    pub value: String,
}

impl ParseValueError {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

/// Ошибки конфигурации оформления
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("Image size must be greater than zero")]
    ZeroSize,

    #[error("Box size must be greater than zero")]
    ZeroBoxSize,

    #[error("{what} {value} exceeds the {max}px limit")]
    TooLarge {
        what: &'static str,
        value: u64,
        max: u32,
    },

    #[error("Failed to access preset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid preset: {0}")]
    Json(#[from] serde_json::Error),
}

/// RGB-цвет
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const WHITE: Color = Color([255, 255, 255]);

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b])
    }

    /// Непрозрачный RGBA-пиксель этого цвета
    pub fn to_rgba(self) -> Rgba<u8> {
        let [r, g, b] = self.0;
        Rgba([r, g, b, 255])
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color([r, g, b]))
            }
            3 => {
                // #abc -> #aabbcc
                let mut channels = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    channels[i] = v * 16 + v;
                }
                Some(Color(channels))
            }
            _ => None,
        }
    }

    fn parse_triple(value: &str) -> Option<Self> {
        let inner = value
            .strip_prefix("rgb(")
            .and_then(|v| v.strip_suffix(')'))
            .unwrap_or(value);

        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return None;
        }

        let mut channels = [0u8; 3];
        for (i, part) in parts.iter().enumerate() {
            channels[i] = part.parse().ok()?;
        }
        Some(Color(channels))
    }
}

impl FromStr for Color {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();

        let parsed = if value.contains(',') {
            Self::parse_triple(&value)
        } else {
            Self::parse_hex(value.trim_start_matches('#'))
        };

        parsed.ok_or_else(|| ParseValueError::new("color", s))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// Форма модулей
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModuleShape {
    #[default]
    Square,
    GappedSquare,
    Circle,
    Rounded,
}

impl ModuleShape {
    pub const ALL: [ModuleShape; 4] = [
        ModuleShape::Square,
        ModuleShape::GappedSquare,
        ModuleShape::Circle,
        ModuleShape::Rounded,
    ];
}

impl FromStr for ModuleShape {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "square" => Ok(ModuleShape::Square),
            "gapped" | "gapped_square" => Ok(ModuleShape::GappedSquare),
            "circle" => Ok(ModuleShape::Circle),
            "rounded" => Ok(ModuleShape::Rounded),
            _ => Err(ParseValueError::new("module shape", s)),
        }
    }
}

/// Уровень коррекции ошибок
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCorrectionLevel {
    L, // ~7%
    M, // ~15%
    Q, // ~25%
    #[default]
    H, // ~30%
}

impl ErrorCorrectionLevel {
    /// Все уровни по возрастанию устойчивости
    pub const ALL: [ErrorCorrectionLevel; 4] = [
        ErrorCorrectionLevel::L,
        ErrorCorrectionLevel::M,
        ErrorCorrectionLevel::Q,
        ErrorCorrectionLevel::H,
    ];
}

impl From<ErrorCorrectionLevel> for qrcode::EcLevel {
    fn from(level: ErrorCorrectionLevel) -> Self {
        match level {
            ErrorCorrectionLevel::L => qrcode::EcLevel::L,
            ErrorCorrectionLevel::M => qrcode::EcLevel::M,
            ErrorCorrectionLevel::Q => qrcode::EcLevel::Q,
            ErrorCorrectionLevel::H => qrcode::EcLevel::H,
        }
    }
}

impl FromStr for ErrorCorrectionLevel {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "l" | "low" => Ok(ErrorCorrectionLevel::L),
            "m" | "medium" => Ok(ErrorCorrectionLevel::M),
            "q" | "quartile" | "high" => Ok(ErrorCorrectionLevel::Q),
            "h" | "max" | "highest" => Ok(ErrorCorrectionLevel::H),
            _ => Err(ParseValueError::new("error correction level", s)),
        }
    }
}

impl fmt::Display for ErrorCorrectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCorrectionLevel::L => "L",
            ErrorCorrectionLevel::M => "M",
            ErrorCorrectionLevel::Q => "Q",
            ErrorCorrectionLevel::H => "H",
        };
        f.write_str(name)
    }
}

/// Источник логотипа
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoSource {
    /// Файл на диске
    Path(PathBuf),
    /// Закодированное изображение (PNG, JPEG, ...) в памяти
    Bytes(Vec<u8>),
}

/// Предельная сторона изображения в пикселях (итог и холст до ресайза)
pub const MAX_IMAGE_SIZE: u32 = 4096;

/// Конфигурация оформления
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Итоговый размер изображения в пикселях (квадрат)
    pub size: u32,
    /// Цвет модулей
    pub foreground: Color,
    /// Цвет фона
    pub background: Color,
    /// Форма модулей
    pub shape: ModuleShape,
    /// Ширина рамки в модулях
    pub border: u32,
    /// Уровень коррекции ошибок
    pub error_correction: ErrorCorrectionLevel,
    /// Размер модуля в пикселях до финального ресайза
    pub box_size: u32,
    /// Логотип в центре
    pub logo: Option<LogoSource>,
    /// Масштабировать логотип до 20% ширины
    pub auto_resize_logo: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            size: 400,
            foreground: Color::BLACK,
            background: Color::WHITE,
            shape: ModuleShape::Square,
            border: 4,
            error_correction: ErrorCorrectionLevel::H,
            box_size: 10,
            logo: None,
            auto_resize_logo: true,
        }
    }
}

impl StyleConfig {
    /// Проверка инвариантов
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.size == 0 {
            return Err(StyleError::ZeroSize);
        }
        if self.box_size == 0 {
            return Err(StyleError::ZeroBoxSize);
        }
        check_limit("image size", self.size as u64)?;
        check_limit("box size", self.box_size as u64)?;
        check_limit("border", self.border as u64)?;
        Ok(())
    }

    /// Сторона холста `(modules + 2 * border) * box_size` до ресайза
    pub fn canvas_side(&self, modules: usize) -> Result<u32, StyleError> {
        let side = (modules as u64)
            .checked_add(2 * self.border as u64)
            .and_then(|n| n.checked_mul(self.box_size as u64))
            .unwrap_or(u64::MAX);
        check_limit("canvas", side)?;
        Ok(side as u32)
    }

    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, StyleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Загрузка пресета из файла
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StyleError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Сохранение пресета в файл
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StyleError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn check_limit(what: &'static str, value: u64) -> Result<(), StyleError> {
    if value > MAX_IMAGE_SIZE as u64 {
        return Err(StyleError::TooLarge {
            what,
            value,
            max: MAX_IMAGE_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!("#FF8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
        assert_eq!("ff8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("10, 20, 30".parse::<Color>().unwrap(), Color::rgb(10, 20, 30));
        assert_eq!("rgb(1,2,3)".parse::<Color>().unwrap(), Color::rgb(1, 2, 3));

        assert!("#12345".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
        assert!("256,0,0".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::rgb(255, 128, 0).to_string(), "#ff8000");
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("gapped".parse::<ModuleShape>().unwrap(), ModuleShape::GappedSquare);
        assert_eq!("Circle".parse::<ModuleShape>().unwrap(), ModuleShape::Circle);
        assert!("star".parse::<ModuleShape>().is_err());

        assert_eq!("q".parse::<ErrorCorrectionLevel>().unwrap(), ErrorCorrectionLevel::Q);
        assert_eq!("H".parse::<ErrorCorrectionLevel>().unwrap(), ErrorCorrectionLevel::H);
        assert!("x".parse::<ErrorCorrectionLevel>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(StyleConfig::default().validate().is_ok());

        let zero_size = StyleConfig { size: 0, ..Default::default() };
        assert!(matches!(zero_size.validate(), Err(StyleError::ZeroSize)));

        let zero_box = StyleConfig { box_size: 0, ..Default::default() };
        assert!(matches!(zero_box.validate(), Err(StyleError::ZeroBoxSize)));

        let huge_border = StyleConfig { border: u32::MAX / 2 + 1, ..Default::default() };
        assert!(matches!(
            huge_border.validate(),
            Err(StyleError::TooLarge { what: "border", .. })
        ));

        let huge_box = StyleConfig { box_size: 100_000, ..Default::default() };
        assert!(matches!(huge_box.validate(), Err(StyleError::TooLarge { what: "box size", .. })));

        let huge_size = StyleConfig { size: 100_000, ..Default::default() };
        assert!(matches!(
            huge_size.validate(),
            Err(StyleError::TooLarge { what: "image size", .. })
        ));

        let at_limit = StyleConfig { size: MAX_IMAGE_SIZE, ..Default::default() };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_canvas_side() {
        let style = StyleConfig::default();
        assert_eq!(style.canvas_side(21).unwrap(), 290);
        assert_eq!(style.canvas_side(177).unwrap(), 1850);

        // Каждое значение в пределах, но произведение - нет
        let wide = StyleConfig { border: 2000, box_size: 2000, ..Default::default() };
        assert!(wide.validate().is_ok());
        assert!(matches!(wide.canvas_side(21), Err(StyleError::TooLarge { what: "canvas", .. })));

        let overflow = StyleConfig { border: u32::MAX, box_size: u32::MAX, ..Default::default() };
        assert!(overflow.canvas_side(usize::MAX).is_err());
    }

    #[test]
    fn test_preset_json() {
        let style = StyleConfig {
            foreground: Color::rgb(16, 185, 129),
            shape: ModuleShape::Rounded,
            error_correction: ErrorCorrectionLevel::M,
            logo: Some(LogoSource::Path(PathBuf::from("logo.png"))),
            ..Default::default()
        };

        let json = style.to_json().unwrap();
        assert!(json.contains("\"#10b981\""));
        assert_eq!(StyleConfig::from_json(&json).unwrap(), style);

        // Отсутствующие поля берутся из значений по умолчанию
        let partial = StyleConfig::from_json(r#"{"size": 256, "shape": "circle"}"#).unwrap();
        assert_eq!(partial.size, 256);
        assert_eq!(partial.shape, ModuleShape::Circle);
        assert_eq!(partial.box_size, 10);
        assert_eq!(partial.error_correction, ErrorCorrectionLevel::H);
    }
}
