//! Kirvano payload extraction.
//!
//! Kirvano quirks: monetary fields arrive as localized strings
//! (`"R$ 169,80"`), the product list is an array where only the first entry
//! maps to the scalar product columns, and payment-method sub-objects
//! (boleto digitable line/barcode, PIX QR) show up only for the matching
//! payment method.

use serde_json::Value;

use crate::money;

use super::{CanonicalEvent, Platform, nested_str, serialized_section, str_field};

/// Map a Kirvano webhook payload into the canonical field set.
pub fn extract_kirvano_data(payload: &Value) -> CanonicalEvent {
    let mut event = CanonicalEvent::new(Platform::Kirvano, payload);

    event.webhook_id = str_field(payload, "checkout_id").or_else(|| str_field(payload, "webhook_id"));
    event.transaction_id = str_field(payload, "sale_id").or_else(|| str_field(payload, "transaction_id"));

    event.customer_email =
        nested_str(payload, &["customer", "email"]).or_else(|| str_field(payload, "customer_email"));
    event.customer_name =
        nested_str(payload, &["customer", "name"]).or_else(|| str_field(payload, "customer_name"));
    event.customer_document = nested_str(payload, &["customer", "document"])
        .or_else(|| str_field(payload, "customer_document"));
    event.customer_phone = nested_str(payload, &["customer", "phone_number"])
        .or_else(|| nested_str(payload, &["customer", "phone"]));

    // Only the first product populates the scalar columns; the full array is
    // preserved as a serialized side-channel.
    if let Some(products) = payload.get("products").and_then(Value::as_array) {
        if let Some(first) = products.first() {
            event.product_name = str_field(first, "name");
            event.product_id = str_field(first, "id");
            event.offer_id = str_field(first, "offer_id");
            event.offer_name = str_field(first, "offer_name");
        }
        if !products.is_empty() {
            event.product_list = serialized_section(payload, "products");
        }
    } else {
        event.product_name = str_field(payload, "product_name");
        event.product_id = str_field(payload, "product_id");
    }

    event.amount = payload
        .get("total_price")
        .or_else(|| payload.get("amount"))
        .and_then(money::parse_amount);
    event.currency = str_field(payload, "currency").or_else(|| Some("BRL".to_string()));
    event.commission_amount = payload
        .get("commission_amount")
        .and_then(money::parse_amount);

    event.payment_method =
        str_field(payload, "payment_method").or_else(|| nested_str(payload, &["payment", "method"]));
    event.status = str_field(payload, "status");

    // Boleto digitable line/barcode and PIX QR live under `payment` and are
    // captured only when present.
    event.payment_details = payment_details(payload);

    event.affiliate_email = str_field(payload, "affiliate_email")
        .or_else(|| nested_str(payload, &["affiliate", "email"]));

    event.utm_source =
        nested_str(payload, &["utm", "utm_source"]).or_else(|| str_field(payload, "utm_source"));
    event.utm_medium =
        nested_str(payload, &["utm", "utm_medium"]).or_else(|| str_field(payload, "utm_medium"));
    event.utm_campaign =
        nested_str(payload, &["utm", "utm_campaign"]).or_else(|| str_field(payload, "utm_campaign"));
    event.sales_link =
        str_field(payload, "sales_link").or_else(|| nested_str(payload, &["utm", "src"]));

    event.attendant_name = str_field(payload, "attendant_name");
    event.attendant_email = str_field(payload, "attendant_email");

    event
}

fn payment_details(payload: &Value) -> Option<String> {
    let payment = payload.get("payment")?.as_object()?;
    let detail_keys = ["digitable_line", "barcode", "qrcode", "qrcode_image", "expires_at"];
    if detail_keys.iter().any(|k| payment.contains_key(*k)) {
        Some(Value::Object(payment.clone()).to_string())
    } else {
        None
    }
}
