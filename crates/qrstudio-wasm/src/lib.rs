//! WASM bindings для генератора QR-кодов
//!
//! Предоставляет JavaScript API для генерации и проверки QR-кодов

use qrstudio_core::{ContentRequest, Generated, LogoSource, QrDecoder, QrStudio, StyleConfig};
use wasm_bindgen::prelude::*;

/// Инициализация panic hook и логирования
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("QR Studio WASM module initialized");
}

fn to_js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// Разбор стиля из JS-объекта; `undefined`/`null` дают стиль по умолчанию
fn style_from_js(style: JsValue, logo: Option<Vec<u8>>) -> Result<StyleConfig, JsError> {
    let mut style: StyleConfig = if style.is_undefined() || style.is_null() {
        StyleConfig::default()
    } else {
        serde_wasm_bindgen::from_value(style).map_err(to_js_error)?
    };

    if let Some(bytes) = logo {
        style.logo = Some(LogoSource::Bytes(bytes));
    }
    if let Some(LogoSource::Path(path)) = &style.logo {
        // В браузере нет файловой системы
        log::warn!("Logo path {} ignored, pass logo bytes instead", path.display());
        style.logo = None;
    }

    style.validate().map_err(to_js_error)?;
    Ok(style)
}

/// JavaScript-доступный генератор QR-кодов
#[wasm_bindgen]
pub struct WasmQrStudio {
    studio: QrStudio,
    decoder: QrDecoder,
}

#[wasm_bindgen]
impl WasmQrStudio {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            studio: QrStudio::new(),
            decoder: QrDecoder::new(),
        }
    }

    /// Генерация PNG
    ///
    /// @param request - `{ kind: "url", url: "..." }` и т.п.
    /// @param style - частичный объект стиля или undefined
    /// @param logo - Uint8Array с изображением логотипа (необязательно)
    /// @returns Uint8Array с PNG
    pub fn generate(
        &self,
        request: JsValue,
        style: JsValue,
        logo: Option<Vec<u8>>,
    ) -> Result<js_sys::Uint8Array, JsError> {
        let png = self.generate_png(request, style, logo)?;
        Ok(js_sys::Uint8Array::from(png.as_slice()))
    }

    /// То же, что `generate`, но строкой base64 (для data: URL)
    #[wasm_bindgen(js_name = generateBase64)]
    pub fn generate_base64(
        &self,
        request: JsValue,
        style: JsValue,
        logo: Option<Vec<u8>>,
    ) -> Result<String, JsError> {
        let generated = self.render(request, style, logo)?;
        generated.image.to_base64_png().map_err(to_js_error)
    }

    /// Строка, которая будет закодирована
    #[wasm_bindgen(js_name = formatPayload)]
    pub fn format_payload(&self, request: JsValue) -> Result<String, JsError> {
        let request: ContentRequest = serde_wasm_bindgen::from_value(request).map_err(to_js_error)?;
        self.studio.payload(&request).map_err(to_js_error)
    }

    /// Декодирование изображения (PNG, JPEG)
    ///
    /// @returns `{ content, kind, error_correction, version }`
    pub fn decode(&self, image_data: &[u8]) -> Result<JsValue, JsError> {
        let decoded = self.decoder.decode_bytes(image_data).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&decoded).map_err(to_js_error)
    }
}

impl WasmQrStudio {
    fn render(
        &self,
        request: JsValue,
        style: JsValue,
        logo: Option<Vec<u8>>,
    ) -> Result<Generated, JsError> {
        let request: ContentRequest = serde_wasm_bindgen::from_value(request).map_err(to_js_error)?;
        let style = style_from_js(style, logo)?;
        self.studio.generate(&request, &style).map_err(to_js_error)
    }

    fn generate_png(
        &self,
        request: JsValue,
        style: JsValue,
        logo: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, JsError> {
        let generated = self.render(request, style, logo)?;
        generated.image.to_png_bytes().map_err(to_js_error)
    }
}

impl Default for WasmQrStudio {
    fn default() -> Self {
        Self::new()
    }
}

/// Информация о версии
#[wasm_bindgen(js_name = version)]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
