//! Модуль платёжной нагрузки QR-кодов
//!
//! Платёжный QR строится внешним кодировщиком (`PaymentEncoder`).
//! Если кодировщик не подключён или вернул ошибку, используется
//! простой текстовый шаблон `PIX:<ключ>|NOME:<имя>|CIDADE:<город>|VALOR:<сумма>`.

use thiserror::Error;

/// Ошибки платёжного кодировщика
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentEncodeError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("Field {field} is too long ({len} characters)")]
    FieldTooLong { field: &'static str, len: usize },
}

/// Поля платёжного запроса в том виде, в каком их ввёл пользователь
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentRequest<'a> {
    /// Ключ получателя (e-mail, телефон, CPF/CNPJ, случайный ключ)
    pub key: &'a str,
    /// Имя получателя
    pub name: &'a str,
    /// Город получателя
    pub city: &'a str,
    /// Сумма (пустая строка - без суммы)
    pub amount: &'a str,
}

impl PaymentRequest<'_> {
    /// Разбор суммы: пусто -> `None`, иначе неотрицательное число
    pub fn parsed_amount(&self) -> Result<Option<f64>, PaymentEncodeError> {
        let raw = self.amount.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
            _ => Err(PaymentEncodeError::InvalidAmount(self.amount.to_string())),
        }
    }
}

/// Кодировщик платёжной строки
pub trait PaymentEncoder {
    fn encode(&self, request: &PaymentRequest<'_>) -> Result<String, PaymentEncodeError>;
}

/// Резервный текстовый шаблон
pub fn fallback_payload(request: &PaymentRequest<'_>) -> String {
    format!(
        "PIX:{}|NOME:{}|CIDADE:{}|VALOR:{}",
        request.key, request.name, request.city, request.amount
    )
}

/// Кодирование с откатом на текстовый шаблон.
///
/// Ошибка кодировщика не пробрасывается наружу: она логируется,
/// а результатом становится `fallback_payload`.
pub fn encode_or_fallback(
    encoder: Option<&dyn PaymentEncoder>,
    request: &PaymentRequest<'_>,
) -> String {
    let Some(encoder) = encoder else {
        log::debug!("No payment encoder installed, using fallback template");
        return fallback_payload(request);
    };

    match encoder.encode(request) {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("Payment encoder failed ({}), using fallback template", e);
            fallback_payload(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEncoder;

    impl PaymentEncoder for FixedEncoder {
        fn encode(&self, _request: &PaymentRequest<'_>) -> Result<String, PaymentEncodeError> {
            Ok("ENCODED".to_string())
        }
    }

    struct FailingEncoder;

    impl PaymentEncoder for FailingEncoder {
        fn encode(&self, _request: &PaymentRequest<'_>) -> Result<String, PaymentEncodeError> {
            Err(PaymentEncodeError::MissingField("key"))
        }
    }

    fn request() -> PaymentRequest<'static> {
        PaymentRequest {
            key: "joao@example.com",
            name: "Joao",
            city: "Recife",
            amount: "12,50",
        }
    }

    #[test]
    fn test_fallback_template() {
        assert_eq!(
            fallback_payload(&request()),
            "PIX:joao@example.com|NOME:Joao|CIDADE:Recife|VALOR:12,50"
        );
    }

    #[test]
    fn test_encode_or_fallback() {
        let req = request();

        assert_eq!(encode_or_fallback(Some(&FixedEncoder), &req), "ENCODED");
        assert_eq!(encode_or_fallback(Some(&FailingEncoder), &req), fallback_payload(&req));
        assert_eq!(encode_or_fallback(None, &req), fallback_payload(&req));
    }

    #[test]
    fn test_parsed_amount() {
        let mut req = request();

        req.amount = "";
        assert_eq!(req.parsed_amount(), Ok(None));

        req.amount = " 10.5 ";
        assert_eq!(req.parsed_amount(), Ok(Some(10.5)));

        req.amount = "12,50";
        assert!(req.parsed_amount().is_err());

        req.amount = "-1";
        assert!(req.parsed_amount().is_err());
    }
}
