//! Модуль формирования содержимого QR-кода
//!
//! Превращает структурированный запрос в строку для кодирования:
//! - текст и URL передаются как есть
//! - телефон и e-mail оборачиваются в `tel:` / `mailto:`
//! - Wi-Fi, vCard и PIX собираются по фиксированным шаблонам
//!
//! Содержимое полей не проверяется и не экранируется.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::payment::{self, PaymentEncoder, PaymentRequest};
#[cfg(feature = "pix")]
use crate::pix::PixEncoder;
use crate::pix::BrCode;
use crate::style::ParseValueError;

/// Тип защиты Wi-Fi сети
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WifiSecurity {
    #[default]
    Wpa,
    Wep,
    Open,
}

impl WifiSecurity {
    /// Значение поля `T:` в строке Wi-Fi
    pub fn as_token(&self) -> &'static str {
        match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::Open => "nopass",
        }
    }
}

impl FromStr for WifiSecurity {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wpa" | "wpa2" | "wpa3" => Ok(WifiSecurity::Wpa),
            "wep" => Ok(WifiSecurity::Wep),
            "open" | "nopass" | "none" => Ok(WifiSecurity::Open),
            _ => Err(ParseValueError::new("wifi security", s)),
        }
    }
}

/// Запрос на формирование содержимого
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentRequest {
    PlainText {
        text: String,
    },
    Url {
        url: String,
    },
    Phone {
        number: String,
    },
    WifiCredential {
        ssid: String,
        #[serde(default)]
        password: String,
        #[serde(default)]
        security: WifiSecurity,
    },
    Email {
        address: String,
    },
    ContactCard {
        name: String,
        #[serde(default)]
        phone: String,
        #[serde(default)]
        email: String,
    },
    PaymentKey {
        key: String,
        name: String,
        city: String,
        #[serde(default)]
        amount: String,
    },
}

impl ContentRequest {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentRequest::PlainText { .. } => ContentKind::PlainText,
            ContentRequest::Url { .. } => ContentKind::Url,
            ContentRequest::Phone { .. } => ContentKind::Phone,
            ContentRequest::WifiCredential { .. } => ContentKind::WifiCredential,
            ContentRequest::Email { .. } => ContentKind::Email,
            ContentRequest::ContactCard { .. } => ContentKind::ContactCard,
            ContentRequest::PaymentKey { .. } => ContentKind::PaymentKey,
        }
    }

    /// Все текстовые поля пустые. Тип защиты Wi-Fi полем не считается:
    /// сеть без SSID и пароля - пустой запрос.
    pub fn is_blank(&self) -> bool {
        let fields: Vec<&String> = match self {
            ContentRequest::PlainText { text } => vec![text],
            ContentRequest::Url { url } => vec![url],
            ContentRequest::Phone { number } => vec![number],
            ContentRequest::WifiCredential { ssid, password, .. } => vec![ssid, password],
            ContentRequest::Email { address } => vec![address],
            ContentRequest::ContactCard { name, phone, email } => vec![name, phone, email],
            ContentRequest::PaymentKey {
                key,
                name,
                city,
                amount,
            } => vec![key, name, city, amount],
        };
        fields.iter().all(|f| f.is_empty())
    }
}

/// Тип содержимого QR-кода
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    PlainText,
    Url,
    Phone,
    WifiCredential,
    Email,
    ContactCard,
    PaymentKey,
}

impl ContentKind {
    /// Определение типа по готовой строке (например, после декодирования)
    pub fn detect(content: &str) -> Self {
        let content_lower = content.to_lowercase();

        if content_lower.starts_with("tel:") {
            ContentKind::Phone
        } else if content_lower.starts_with("mailto:") {
            ContentKind::Email
        } else if content_lower.starts_with("wifi:") {
            ContentKind::WifiCredential
        } else if content_lower.starts_with("begin:vcard") {
            ContentKind::ContactCard
        } else if content_lower.starts_with("http://") || content_lower.starts_with("https://") {
            ContentKind::Url
        } else if content.starts_with("PIX:") {
            ContentKind::PaymentKey
        } else if content.starts_with("000201") && BrCode::parse(content).map(|c| c.is_pix()).unwrap_or(false) {
            // BR Code начинается с Payload Format Indicator "01"
            ContentKind::PaymentKey
        } else {
            ContentKind::PlainText
        }
    }
}

/// Формирователь содержимого
pub struct PayloadFormatter {
    payment_encoder: Option<Box<dyn PaymentEncoder>>,
}

impl Default for PayloadFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadFormatter {
    /// Формирователь со встроенным PIX-кодировщиком (если включена фича `pix`)
    pub fn new() -> Self {
        #[cfg(feature = "pix")]
        let payment_encoder: Option<Box<dyn PaymentEncoder>> = Some(Box::new(PixEncoder::new()));
        #[cfg(not(feature = "pix"))]
        let payment_encoder: Option<Box<dyn PaymentEncoder>> = None;

        Self { payment_encoder }
    }

    /// Без платёжного кодировщика: PIX всегда по текстовому шаблону
    pub fn without_payment_encoder() -> Self {
        Self {
            payment_encoder: None,
        }
    }

    pub fn with_payment_encoder(encoder: impl PaymentEncoder + 'static) -> Self {
        Self {
            payment_encoder: Some(Box::new(encoder)),
        }
    }

    pub fn has_payment_encoder(&self) -> bool {
        self.payment_encoder.is_some()
    }

    /// Строка для кодирования в QR
    pub fn format(&self, request: &ContentRequest) -> String {
        match request {
            ContentRequest::PlainText { text } => text.clone(),
            ContentRequest::Url { url } => url.clone(),
            ContentRequest::Phone { number } => format!("tel:{}", number),
            ContentRequest::Email { address } => format!("mailto:{}", address),
            ContentRequest::WifiCredential {
                ssid,
                password,
                security,
            } => format!("WIFI:T:{};S:{};P:{};;", security.as_token(), ssid, password),
            ContentRequest::ContactCard { name, phone, email } => format!(
                "BEGIN:VCARD\nVERSION:3.0\nN:{}\nTEL:{}\nEMAIL:{}\nEND:VCARD",
                name, phone, email
            ),
            ContentRequest::PaymentKey {
                key,
                name,
                city,
                amount,
            } => {
                let request = PaymentRequest {
                    key,
                    name,
                    city,
                    amount,
                };
                payment::encode_or_fallback(self.payment_encoder.as_deref(), &request)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentEncodeError;

    struct BrokenEncoder;

    impl PaymentEncoder for BrokenEncoder {
        fn encode(&self, _request: &PaymentRequest<'_>) -> Result<String, PaymentEncodeError> {
            Err(PaymentEncodeError::InvalidAmount("?".to_string()))
        }
    }

    fn pix_request(amount: &str) -> ContentRequest {
        ContentRequest::PaymentKey {
            key: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            city: "Natal".to_string(),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn test_templates() {
        let formatter = PayloadFormatter::without_payment_encoder();

        let wifi = ContentRequest::WifiCredential {
            ssid: "Home".to_string(),
            password: "secret".to_string(),
            security: WifiSecurity::Wpa,
        };
        assert_eq!(formatter.format(&wifi), "WIFI:T:WPA;S:Home;P:secret;;");

        let open = ContentRequest::WifiCredential {
            ssid: "Cafe".to_string(),
            password: String::new(),
            security: WifiSecurity::Open,
        };
        assert_eq!(formatter.format(&open), "WIFI:T:nopass;S:Cafe;P:;;");

        let phone = ContentRequest::Phone { number: "+15551234".to_string() };
        assert_eq!(formatter.format(&phone), "tel:+15551234");

        let email = ContentRequest::Email { address: "j@x.com".to_string() };
        assert_eq!(formatter.format(&email), "mailto:j@x.com");

        let card = ContentRequest::ContactCard {
            name: "Jane".to_string(),
            phone: "123".to_string(),
            email: "j@x.com".to_string(),
        };
        assert_eq!(
            formatter.format(&card),
            "BEGIN:VCARD\nVERSION:3.0\nN:Jane\nTEL:123\nEMAIL:j@x.com\nEND:VCARD"
        );

        let text = ContentRequest::PlainText { text: "  as is;\n".to_string() };
        assert_eq!(formatter.format(&text), "  as is;\n");

        let url = ContentRequest::Url { url: "https://example.com/?q=1".to_string() };
        assert_eq!(formatter.format(&url), "https://example.com/?q=1");
    }

    #[test]
    fn test_empty_fields_pass_through() {
        let formatter = PayloadFormatter::without_payment_encoder();
        let card = ContentRequest::ContactCard {
            name: String::new(),
            phone: String::new(),
            email: String::new(),
        };
        assert_eq!(
            formatter.format(&card),
            "BEGIN:VCARD\nVERSION:3.0\nN:\nTEL:\nEMAIL:\nEND:VCARD"
        );
        assert!(card.is_blank());
    }

    #[test]
    fn test_payment_fallback() {
        let fallback = "PIX:ana@example.com|NOME:Ana|CIDADE:Natal|VALOR:5";

        let without = PayloadFormatter::without_payment_encoder();
        assert!(!without.has_payment_encoder());
        assert_eq!(without.format(&pix_request("5")), fallback);

        let broken = PayloadFormatter::with_payment_encoder(BrokenEncoder);
        assert_eq!(broken.format(&pix_request("5")), fallback);
    }

    #[cfg(feature = "pix")]
    #[test]
    fn test_payment_encoded_with_pix() {
        let formatter = PayloadFormatter::new();
        assert!(formatter.has_payment_encoder());

        let payload = formatter.format(&pix_request("5"));
        assert!(payload.starts_with("000201"));
        let parsed = BrCode::parse(&payload).unwrap();
        assert_eq!(parsed.pix_key(), Some("ana@example.com"));
        assert_eq!(parsed.transaction_amount.as_deref(), Some("5.00"));

        // Сумма с запятой не разбирается кодировщиком -> шаблон
        assert_eq!(
            formatter.format(&pix_request("5,00")),
            "PIX:ana@example.com|NOME:Ana|CIDADE:Natal|VALOR:5,00"
        );

        // Сумма длиннее 13 символов тега 54 -> шаблон
        assert_eq!(
            formatter.format(&pix_request("12345678901234")),
            "PIX:ana@example.com|NOME:Ana|CIDADE:Natal|VALOR:12345678901234"
        );
    }

    #[test]
    fn test_is_blank() {
        assert!(ContentRequest::PlainText { text: String::new() }.is_blank());
        assert!(!ContentRequest::Phone { number: "1".to_string() }.is_blank());
        assert!(ContentRequest::WifiCredential {
            ssid: String::new(),
            password: String::new(),
            security: WifiSecurity::Wep,
        }
        .is_blank());
        assert!(!pix_request("").is_blank());
    }

    #[test]
    fn test_content_kind_detection() {
        let formatter = PayloadFormatter::new();
        let requests = [
            ContentRequest::Url { url: "https://example.com".to_string() },
            ContentRequest::Phone { number: "+5511999999999".to_string() },
            ContentRequest::Email { address: "a@b.c".to_string() },
            ContentRequest::WifiCredential {
                ssid: "Net".to_string(),
                password: "pw".to_string(),
                security: WifiSecurity::Wpa,
            },
            ContentRequest::ContactCard {
                name: "Jane".to_string(),
                phone: "1".to_string(),
                email: "j@x.com".to_string(),
            },
            pix_request("1.99"),
            pix_request("not a number"),
            ContentRequest::PlainText { text: "Hello World".to_string() },
        ];

        for request in &requests {
            assert_eq!(ContentKind::detect(&formatter.format(request)), request.kind());
        }
    }

    #[test]
    fn test_request_json() {
        let json = r#"{"kind": "wifi_credential", "ssid": "Home", "password": "secret"}"#;
        let request: ContentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request,
            ContentRequest::WifiCredential {
                ssid: "Home".to_string(),
                password: "secret".to_string(),
                security: WifiSecurity::Wpa,
            }
        );
    }
}
