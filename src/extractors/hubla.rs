//! Hubla payload extraction.
//!
//! Hubla ships two incompatible payload shapes distinguished by an explicit
//! `version` field. v2 (`"2.0.0"`) nests everything under
//! `event.user`/`event.payer`/`event.invoice`/`event.subscription` with
//! amounts in integer cents; v1 (`"1.0.0"`, and payloads with no version at
//! all) is flat under a `data` envelope with amounts already in base units.

use serde_json::Value;

use crate::money;

use super::{CanonicalEvent, Platform, event_name, nested, nested_str, str_field};

/// Map a Hubla webhook payload into the canonical field set, branching on
/// the payload `version`.
pub fn extract_hubla_data(payload: &Value) -> CanonicalEvent {
    let version = payload.get("version").and_then(Value::as_str).unwrap_or("1.0.0");
    if version.starts_with("2.") {
        extract_v2(payload)
    } else {
        extract_v1(payload)
    }
}

fn extract_v1(payload: &Value) -> CanonicalEvent {
    let mut event = CanonicalEvent::new(Platform::Hubla, payload);

    // v1 nests the sale under `data`; older deliveries were fully flat.
    let data = payload.get("data").unwrap_or(payload);

    event.webhook_id = str_field(payload, "id").or_else(|| str_field(data, "id"));
    event.transaction_id = str_field(data, "id").or_else(|| str_field(data, "transaction_id"));

    event.customer_email =
        str_field(data, "customer_email").or_else(|| str_field(data, "email"));
    event.customer_name = str_field(data, "customer_name").or_else(|| str_field(data, "name"));
    event.customer_document = str_field(data, "customer_document").or_else(|| str_field(data, "document"));
    event.customer_phone = str_field(data, "customer_phone").or_else(|| str_field(data, "phone"));

    event.product_name = str_field(data, "product_name");
    event.product_id = str_field(data, "product_id");

    // v1 amounts are already denominated in base units
    event.amount = data.get("amount").and_then(Value::as_f64);
    event.currency = str_field(data, "currency").or_else(|| Some("BRL".to_string()));
    event.commission_amount = data.get("commission_amount").and_then(Value::as_f64);

    event.payment_method = str_field(data, "payment_method");
    event.status = str_field(data, "status");
    event.affiliate_email = str_field(data, "affiliate_email");

    event.utm_source = str_field(data, "utm_source");
    event.utm_medium = str_field(data, "utm_medium");
    event.utm_campaign = str_field(data, "utm_campaign");
    event.sales_link = str_field(data, "sales_link");

    event
}

fn extract_v2(payload: &Value) -> CanonicalEvent {
    let mut event = CanonicalEvent::new(Platform::Hubla, payload);

    // v2 names the event under `type`; `event` is the data envelope
    if let Some(kind) = payload.get("type").and_then(Value::as_str) {
        event.event_type = kind.to_string();
    } else {
        event.event_type = event_name(payload);
    }

    event.webhook_id = str_field(payload, "id");
    event.transaction_id = nested_str(payload, &["event", "invoice", "id"]);

    // payer is the person who paid; fall back to the account user
    event.customer_email = nested_str(payload, &["event", "payer", "email"])
        .or_else(|| nested_str(payload, &["event", "user", "email"]));
    event.customer_name = nested_str(payload, &["event", "payer", "name"])
        .or_else(|| nested_str(payload, &["event", "user", "name"]));
    event.customer_document = nested_str(payload, &["event", "payer", "document"])
        .or_else(|| nested_str(payload, &["event", "user", "document"]));
    event.customer_phone = nested_str(payload, &["event", "payer", "phone"])
        .or_else(|| nested_str(payload, &["event", "user", "phone"]));

    if let Some(first) = nested(payload, &["event", "products"])
        .and_then(Value::as_array)
        .and_then(|products| products.first())
    {
        event.product_name = str_field(first, "name");
        event.product_id = str_field(first, "id");
    } else {
        event.product_name = nested_str(payload, &["event", "subscription", "product", "name"]);
        event.product_id = nested_str(payload, &["event", "subscription", "product", "id"]);
    }

    // v2 amounts are declared in integer cents; no magnitude guessing
    event.amount = nested(payload, &["event", "invoice", "amount", "totalCents"])
        .or_else(|| nested(payload, &["event", "invoice", "totalCents"]))
        .and_then(money::parse_cents);
    event.commission_amount = nested(payload, &["event", "invoice", "sellerCommissionCents"])
        .and_then(money::parse_cents);
    event.currency = nested_str(payload, &["event", "invoice", "currency"])
        .or_else(|| Some("BRL".to_string()));

    event.payment_method = nested_str(payload, &["event", "invoice", "paymentMethod"]);
    event.status = nested_str(payload, &["event", "invoice", "status"]);

    event.affiliate_email = nested_str(payload, &["event", "affiliate", "email"]);

    event.utm_source = nested_str(payload, &["event", "utm", "source"]);
    event.utm_medium = nested_str(payload, &["event", "utm", "medium"]);
    event.utm_campaign = nested_str(payload, &["event", "utm", "campaign"]);
    event.sales_link = nested_str(payload, &["event", "invoice", "url"]);

    event
}
