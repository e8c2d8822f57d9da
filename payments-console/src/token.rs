//! Decoding of payment links.
//!
//! A payment link carries a JWT-style token as its whole query string:
//! `https://pay.example/?<header>.<payload>.<signature>`. Only the payload is read; the
//! signature is not verified.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// base64url that also accepts padded input and non-canonical trailing bits.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("URL does not contain a token query part.")]
    MissingQuery,

    #[error("Token not found or invalid JWT format.")]
    InvalidFormat,

    #[error("Token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The payment fields the console works with. Fields that are absent or falsy in the
/// token are left out.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extracted {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_project_item_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_purpose: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedLink {
    pub token: String,
    pub payload: Value,
    pub extracted: Extracted,
}

impl DecodedLink {
    /// The board item id carried by the token, as text.
    pub fn single_project_item_id(&self) -> Option<String> {
        self.extracted
            .single_project_item_id
            .as_ref()
            .and_then(value_as_text)
    }
}

pub fn decode_link(link: &str) -> Result<DecodedLink, DecodeError> {
    let (_, query) = link.split_once('?').ok_or(DecodeError::MissingQuery)?;
    let token = query.trim();

    let parts: Vec<&str> = token.split('.').collect();
    if token.is_empty() || parts.len() < 3 {
        return Err(DecodeError::InvalidFormat);
    }

    let payload = decode_payload(parts[1])?;
    let extracted = extract(&payload);

    Ok(DecodedLink {
        token: token.to_string(),
        payload,
        extracted,
    })
}

fn decode_payload(segment: &str) -> Result<Value, DecodeError> {
    let normalized: String = segment
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE.decode(normalized)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn extract(payload: &Value) -> Extracted {
    let field = |name: &str| payload.get(name).filter(|v| is_truthy(v)).cloned();

    Extracted {
        kind: field("type"),
        amount: field("amount").as_ref().and_then(value_as_number),
        currency: field("currency"),
        transaction_id: field("transactionId"),
        internal_id: field("internalId"),
        single_project_item_id: field("singleProjectItemId"),
        payment_purpose: field("paymentPurpose"),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numbers as they are; strings parsed after trimming.
pub fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Non-empty strings and numbers as text.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
