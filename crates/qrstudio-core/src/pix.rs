//! PIX BR Code (EMV MPM) payload encoding and parsing.
//!
//! The encoder emits a static BR Code:
//!
//! ```text
//! 00 02 01                         Payload Format Indicator
//! 26 .. 00 14 br.gov.bcb.pix       Merchant Account Information
//!       01 .. <key>
//! 52 04 0000                       Merchant Category Code
//! 53 03 986                        Transaction Currency (BRL)
//! 54 .. <amount>                   Transaction Amount (optional)
//! 58 02 BR                         Country Code
//! 59 .. <name>                     Merchant Name (max 25)
//! 60 .. <city>                     Merchant City (max 15)
//! 62 .. 05 .. <txid>               Additional Data Field
//! 63 04 <crc>                      CRC16/CCITT-FALSE
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payment::{PaymentEncodeError, PaymentEncoder, PaymentRequest};

/// Globally unique identifier of the PIX arrangement (tag 26, sub-tag 00).
pub const PIX_GUI: &str = "br.gov.bcb.pix";

const MAX_NAME_LEN: usize = 25;
const MAX_CITY_LEN: usize = 15;
const MAX_AMOUNT_LEN: usize = 13;
const MAX_VALUE_LEN: usize = 99;
const CRC_TAG: &str = "6304";

/// BR Code parsing errors
#[derive(Error, Debug, PartialEq)]
pub enum BrCodeError {
    #[error("Invalid CRC: expected {expected}, got {actual}")]
    InvalidCrc { expected: String, actual: String },
    #[error("Missing Checksum (Tag 63)")]
    MissingChecksum,
    #[error("Malformed TLV data")]
    MalformedData,
}

/// Static PIX payload encoder.
#[derive(Debug, Clone)]
pub struct PixEncoder {
    txid: String,
}

impl Default for PixEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PixEncoder {
    /// Encoder without a transaction id (`***`).
    pub fn new() -> Self {
        Self {
            txid: "***".to_string(),
        }
    }

    pub fn with_txid(txid: impl Into<String>) -> Self {
        Self { txid: txid.into() }
    }
}

impl PaymentEncoder for PixEncoder {
    fn encode(&self, request: &PaymentRequest<'_>) -> Result<String, PaymentEncodeError> {
        let key = required(request.key, "key")?;
        let name = truncate(required(request.name, "name")?, MAX_NAME_LEN);
        let city = truncate(required(request.city, "city")?, MAX_CITY_LEN);
        let amount = request.parsed_amount()?;

        let mut account = String::new();
        push_tlv(&mut account, "00", PIX_GUI, "gui")?;
        push_tlv(&mut account, "01", key, "key")?;

        let mut additional = String::new();
        push_tlv(&mut additional, "05", &self.txid, "txid")?;

        let mut payload = String::new();
        push_tlv(&mut payload, "00", "01", "payload format")?;
        push_tlv(&mut payload, "26", &account, "merchant account")?;
        push_tlv(&mut payload, "52", "0000", "category code")?;
        push_tlv(&mut payload, "53", "986", "currency")?;
        if let Some(amount) = amount {
            let amount = format!("{:.2}", amount);
            if amount.len() > MAX_AMOUNT_LEN {
                return Err(PaymentEncodeError::FieldTooLong {
                    field: "amount",
                    len: amount.len(),
                });
            }
            push_tlv(&mut payload, "54", &amount, "amount")?;
        }
        push_tlv(&mut payload, "58", "BR", "country")?;
        push_tlv(&mut payload, "59", name, "name")?;
        push_tlv(&mut payload, "60", city, "city")?;
        push_tlv(&mut payload, "62", &additional, "additional data")?;

        payload.push_str(CRC_TAG);
        let crc = crc16_ccitt(payload.as_bytes());
        payload.push_str(&format!("{:04X}", crc));

        Ok(payload)
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, PaymentEncodeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PaymentEncodeError::MissingField(field));
    }
    Ok(value)
}

fn truncate(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

fn push_tlv(
    out: &mut String,
    tag: &str,
    value: &str,
    field: &'static str,
) -> Result<(), PaymentEncodeError> {
    let len = value.chars().count();
    if len > MAX_VALUE_LEN {
        return Err(PaymentEncodeError::FieldTooLong { field, len });
    }
    out.push_str(&format!("{}{:02}{}", tag, len, value));
    Ok(())
}

/// Parsed BR Code
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BrCode {
    pub raw_data: String,
    pub pfi: String, // Payload Format Indicator (00)
    pub merchant_account_information: HashMap<String, String>, // (26), sub-tags
    pub merchant_category_code: Option<String>, // (52)
    pub transaction_currency: Option<String>, // (53)
    pub transaction_amount: Option<String>, // (54)
    pub country_code: Option<String>, // (58)
    pub merchant_name: Option<String>, // (59)
    pub merchant_city: Option<String>, // (60)
    pub additional_data: HashMap<String, String>, // (62), sub-tags
    pub crc: String, // (63)
    pub unparsed_tags: HashMap<String, String>,
}

impl BrCode {
    pub fn parse(raw: &str) -> Result<Self, BrCodeError> {
        // 1. Validate CRC first
        Self::validate_crc(raw)?;

        // 2. Parse TLV
        let mut tags = parse_tlv(raw)?;

        // 3. Map to Struct
        let pfi = tags.remove("00").ok_or(BrCodeError::MalformedData)?;
        let crc = tags.remove("63").ok_or(BrCodeError::MissingChecksum)?;

        let merchant_account_information = match tags.remove("26") {
            Some(value) => parse_tlv(&value)?,
            None => HashMap::new(),
        };
        let additional_data = match tags.remove("62") {
            Some(value) => parse_tlv(&value)?,
            None => HashMap::new(),
        };

        Ok(BrCode {
            raw_data: raw.to_string(),
            pfi,
            merchant_account_information,
            merchant_category_code: tags.remove("52"),
            transaction_currency: tags.remove("53"),
            transaction_amount: tags.remove("54"),
            country_code: tags.remove("58"),
            merchant_name: tags.remove("59"),
            merchant_city: tags.remove("60"),
            additional_data,
            crc,
            unparsed_tags: tags,
        })
    }

    /// True when tag 26 carries the PIX GUI.
    pub fn is_pix(&self) -> bool {
        self.merchant_account_information
            .get("00")
            .map(|gui| gui.eq_ignore_ascii_case(PIX_GUI))
            .unwrap_or(false)
    }

    pub fn pix_key(&self) -> Option<&str> {
        self.merchant_account_information.get("01").map(String::as_str)
    }

    pub fn txid(&self) -> Option<&str> {
        self.additional_data.get("05").map(String::as_str)
    }

    fn validate_crc(raw: &str) -> Result<(), BrCodeError> {
        let len = raw.len();
        if len < 8 {
            return Err(BrCodeError::MalformedData);
        }

        // CRC must be the last data object: ... + '63' + '04' + 'XXXX'
        let checksum_tag = raw.get(len - 8..len - 4).ok_or(BrCodeError::MalformedData)?;
        if checksum_tag != CRC_TAG {
            return Err(BrCodeError::MissingChecksum);
        }

        let provided_crc = &raw[len - 4..];
        let data_to_check = &raw[..len - 4];

        let calculated_hex = format!("{:04X}", crc16_ccitt(data_to_check.as_bytes()));

        if provided_crc.to_uppercase() != calculated_hex {
            return Err(BrCodeError::InvalidCrc {
                expected: calculated_hex,
                actual: provided_crc.to_string(),
            });
        }

        Ok(())
    }
}

fn parse_tlv(data: &str) -> Result<HashMap<String, String>, BrCodeError> {
    let mut tags = HashMap::new();
    let chars: Vec<char> = data.chars().collect();
    let len = chars.len();
    let mut idx = 0;

    while idx < len {
        if idx + 4 > len {
            return Err(BrCodeError::MalformedData);
        }

        let tag: String = chars[idx..idx + 2].iter().collect();
        let len_str: String = chars[idx + 2..idx + 4].iter().collect();
        let value_len = len_str.parse::<usize>().map_err(|_| BrCodeError::MalformedData)?;

        if idx + 4 + value_len > len {
            return Err(BrCodeError::MalformedData);
        }

        let value: String = chars[idx + 4..idx + 4 + value_len].iter().collect();
        tags.insert(tag, value);
        idx += 4 + value_len;
    }

    Ok(tags)
}

// CRC-16/CCITT-FALSE
// Poly: 0x1021
// Init: 0xFFFF
pub(crate) fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        let x = ((crc >> 8) ^ byte as u16) & 0xFF;
        let x = x ^ (x >> 4);
        crc = (crc << 8) ^ (x << 12) ^ (x << 5) ^ x;
    }
    crc
}
