//! Payload normalization for the supported checkout platforms.
//!
//! Each platform encodes money, nested customer/product/affiliate objects and
//! event names differently. The extractors here are pure functions mapping an
//! arbitrary JSON payload into the one flat [`CanonicalEvent`] column set,
//! losslessly enough for reporting while the original payload survives in
//! `raw_data`. The shared contract: never panic, default every missing field
//! to `None`, and never let a structured value leak into a scalar column
//! without serializing it first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

mod braip;
mod cakto;
mod hubla;
mod kirvano;

pub use braip::extract_braip_data;
pub use cakto::extract_cakto_data;
pub use hubla::extract_hubla_data;
pub use kirvano::extract_kirvano_data;

/// Fallback event name when the payload carries none of the known keys.
pub const DEFAULT_EVENT_TYPE: &str = "webhook";

/// Canonical registry of supported origin platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Kirvano,
    Hubla,
    Braip,
    Cakto,
}

/// Complete registry of platforms, in route-registration order.
pub const ALL_PLATFORMS: &[Platform] = &[
    Platform::Kirvano,
    Platform::Hubla,
    Platform::Braip,
    Platform::Cakto,
];

impl Platform {
    /// Return the canonical slug stored in the `platform` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Platform::Kirvano => "kirvano",
            Platform::Hubla => "hubla",
            Platform::Braip => "braip",
            Platform::Cakto => "cakto",
        }
    }

    /// Header carrying the HMAC-SHA256 hex digest for this platform.
    pub const fn signature_header(self) -> &'static str {
        match self {
            Platform::Kirvano => "x-kirvano-signature",
            Platform::Hubla => "x-hubla-signature",
            Platform::Braip => "x-braip-signature",
            Platform::Cakto => "x-cakto-signature",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_PLATFORMS
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// Error returned when a path segment names no supported platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

/// The flat canonical field set every payload is mapped into before
/// persistence. All fields are optional except `platform`, `event_type` and
/// `raw_data`, since upstream payloads are inconsistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalEvent {
    pub platform: Platform,
    pub event_type: String,
    pub webhook_id: Option<String>,
    pub transaction_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_document: Option<String>,
    pub customer_phone: Option<String>,
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub offer_id: Option<String>,
    pub offer_name: Option<String>,
    /// Serialized product array side-channel when the platform sends a list.
    pub product_list: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub commission_amount: Option<f64>,
    pub payment_method: Option<String>,
    /// Serialized payment-method sub-object (boleto lines, PIX QR, card).
    pub payment_details: Option<String>,
    pub status: Option<String>,
    pub affiliate_email: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub sales_link: Option<String>,
    pub attendant_name: Option<String>,
    pub attendant_email: Option<String>,
    /// The entire original payload serialized as text; always populated.
    pub raw_data: String,
}

impl CanonicalEvent {
    /// Start an empty canonical mapping: event name resolved from the
    /// payload, audit trail captured, everything else defaulted to `None`.
    pub fn new(platform: Platform, payload: &Value) -> Self {
        Self {
            platform,
            event_type: event_name(payload),
            webhook_id: None,
            transaction_id: None,
            customer_email: None,
            customer_name: None,
            customer_document: None,
            customer_phone: None,
            product_name: None,
            product_id: None,
            offer_id: None,
            offer_name: None,
            product_list: None,
            amount: None,
            currency: None,
            commission_amount: None,
            payment_method: None,
            payment_details: None,
            status: None,
            affiliate_email: None,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            sales_link: None,
            attendant_name: None,
            attendant_email: None,
            raw_data: payload.to_string(),
        }
    }
}

/// Map one platform's raw payload into the canonical field set.
pub fn extract(platform: Platform, payload: &Value) -> CanonicalEvent {
    match platform {
        Platform::Kirvano => extract_kirvano_data(payload),
        Platform::Hubla => extract_hubla_data(payload),
        Platform::Braip => extract_braip_data(payload),
        Platform::Cakto => extract_cakto_data(payload),
    }
}

/// Resolve the event's category name from the first *string* value among the
/// keys platforms use (`event`, `type`, `event_type`). Hubla v2 puts an
/// object under `event`, so non-string values are skipped rather than
/// serialized.
pub fn event_name(payload: &Value) -> String {
    for key in ["event", "type", "event_type"] {
        if let Some(name) = payload.get(key).and_then(Value::as_str) {
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    DEFAULT_EVENT_TYPE.to_string()
}

/// Fetch a field and coerce it into a string column value.
///
/// Scalars stringify naturally; objects and arrays are re-serialized to JSON
/// text so the persistence layer never sees a structured value in a scalar
/// column. Null and a missing key are both `None`.
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(value_to_string)
}

/// Walk a nested path, returning `None` the moment any hop is missing.
pub(crate) fn nested<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Like [`str_field`], but over a nested path.
pub(crate) fn nested_str(value: &Value, path: &[&str]) -> Option<String> {
    nested(value, path).and_then(value_to_string)
}

pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            if s.is_empty() {
                None
            } else {
                Some(s.clone())
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        // Structured values are serialized, never passed through raw
        Value::Object(_) | Value::Array(_) => Some(value.to_string()),
    }
}

/// Serialize a nested payload section verbatim, if present and non-null.
pub(crate) fn serialized_section(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        None | Some(Value::Null) => None,
        Some(section) => Some(section.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn platform_slugs_round_trip() {
        for platform in ALL_PLATFORMS {
            assert_eq!(platform.as_str().parse::<Platform>(), Ok(*platform));
        }
        assert!("shopify".parse::<Platform>().is_err());
    }

    #[test]
    fn event_name_prefers_string_values() {
        assert_eq!(event_name(&json!({"event": "SALE_APPROVED"})), "SALE_APPROVED");
        assert_eq!(event_name(&json!({"type": "NewSale"})), "NewSale");
        assert_eq!(event_name(&json!({"event_type": "purchase_approved"})), "purchase_approved");
        // object under `event` is skipped, falls through to `type`
        assert_eq!(
            event_name(&json!({"event": {"invoice": {}}, "type": "NewSale"})),
            "NewSale"
        );
        assert_eq!(event_name(&json!({"data": {}})), DEFAULT_EVENT_TYPE);
    }

    #[test]
    fn str_field_serializes_structured_values() {
        let payload = json!({"name": "Ana", "meta": {"a": 1}, "tags": [1, 2]});
        assert_eq!(str_field(&payload, "name"), Some("Ana".to_string()));
        assert_eq!(str_field(&payload, "meta"), Some("{\"a\":1}".to_string()));
        assert_eq!(str_field(&payload, "tags"), Some("[1,2]".to_string()));
        assert_eq!(str_field(&payload, "missing"), None);
    }

    #[test]
    fn nested_access_never_panics() {
        let payload = json!({"a": {"b": {"c": "deep"}}});
        assert_eq!(nested_str(&payload, &["a", "b", "c"]), Some("deep".to_string()));
        assert_eq!(nested_str(&payload, &["a", "x", "c"]), None);
        assert_eq!(nested_str(&json!("scalar"), &["a"]), None);
    }

    #[test]
    fn canonical_event_always_keeps_raw_data() {
        let payload = json!({"unmapped": {"deep": true}});
        let event = CanonicalEvent::new(Platform::Kirvano, &payload);
        assert_eq!(event.event_type, DEFAULT_EVENT_TYPE);
        assert_eq!(event.raw_data, payload.to_string());
        assert!(event.amount.is_none());
    }
}
