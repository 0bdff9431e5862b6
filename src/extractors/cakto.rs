//! Cakto payload extraction.
//!
//! Cakto nests the substantive data under a `data` envelope; older
//! integrations delivered the same fields at the top level, so the extractor
//! falls back there. Commission info rides as the first element of a
//! `commissions` array, and payment-method detail objects
//! (card/boleto/pix/picpay) are captured opportunistically. A `secret` field
//! in the body is an authentication concern handled by the HTTP layer, not
//! mapped here.

use serde_json::Value;

use crate::money;

use super::{CanonicalEvent, Platform, nested, nested_str, str_field};

/// Map a Cakto webhook payload (or a synced order) into the canonical
/// field set.
pub fn extract_cakto_data(payload: &Value) -> CanonicalEvent {
    let mut event = CanonicalEvent::new(Platform::Cakto, payload);

    // Envelope with backward-compatible top-level fallback
    let data = payload.get("data").unwrap_or(payload);

    event.webhook_id = str_field(data, "id").or_else(|| str_field(data, "ref"));
    event.transaction_id = str_field(data, "ref").or_else(|| str_field(data, "id"));

    event.customer_email = nested_str(data, &["customer", "email"]);
    event.customer_name = nested_str(data, &["customer", "name"]);
    event.customer_document = nested_str(data, &["customer", "docNumber"])
        .or_else(|| nested_str(data, &["customer", "document"]));
    event.customer_phone = nested_str(data, &["customer", "phone"]);

    event.product_name = nested_str(data, &["product", "name"]);
    event.product_id = nested_str(data, &["product", "id"])
        .or_else(|| nested_str(data, &["product", "short_id"]));
    event.offer_id = nested_str(data, &["offer", "id"]);
    event.offer_name = nested_str(data, &["offer", "name"]);

    event.amount = data
        .get("amount")
        .or_else(|| data.get("baseAmount"))
        .and_then(money::parse_amount);
    event.currency = str_field(data, "currency").or_else(|| Some("BRL".to_string()));

    // Commission info is the first element of the commissions array
    if let Some(first) = data
        .get("commissions")
        .and_then(Value::as_array)
        .and_then(|commissions| commissions.first())
    {
        event.commission_amount = first
            .get("totalAmount")
            .or_else(|| first.get("amount"))
            .and_then(money::parse_amount);
        event.affiliate_email = nested_str(first, &["user", "email"])
            .or_else(|| str_field(first, "email"));
    }

    event.payment_method =
        str_field(data, "paymentMethod").or_else(|| str_field(data, "payment_method"));
    event.status = str_field(data, "status");

    event.payment_details = payment_details(data);

    event.utm_source = str_field(data, "utm_source");
    event.utm_medium = str_field(data, "utm_medium");
    event.utm_campaign = str_field(data, "utm_campaign");
    event.sales_link = str_field(data, "checkoutUrl").or_else(|| str_field(data, "sales_link"));

    event
}

/// Serialize whichever payment-method detail object is present.
fn payment_details(data: &Value) -> Option<String> {
    for key in ["card", "boleto", "pix", "picpay"] {
        match nested(data, &[key]) {
            Some(Value::Null) | None => continue,
            Some(section) => {
                let mut wrapper = serde_json::Map::new();
                wrapper.insert(key.to_string(), section.clone());
                return Some(Value::Object(wrapper).to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn purchase_payload() -> Value {
        json!({
            "event": "purchase_approved",
            "secret": "shared-secret-value",
            "data": {
                "id": "cakto_1",
                "ref": "ref_789",
                "amount": 89.90,
                "status": "approved",
                "paymentMethod": "pix",
                "customer": {
                    "name": "Paula Reis",
                    "email": "paula@example.com",
                    "docNumber": "11122233344",
                    "phone": "+5531966665555"
                },
                "product": {"id": "prod_c1", "name": "Mentoria"},
                "offer": {"id": "off_c1", "name": "Oferta Base"},
                "commissions": [
                    {"totalAmount": 17.98, "user": {"email": "parceiro@example.com"}},
                    {"totalAmount": 4.50, "user": {"email": "outro@example.com"}}
                ],
                "pix": {"qrCode": "00020126PIXDATA", "expirationDate": "2026-05-12"},
                "checkoutUrl": "https://pay.cakto.com.br/ref_789"
            }
        })
    }

    #[test]
    fn maps_enveloped_fields() {
        let payload = purchase_payload();
        let event = extract_cakto_data(&payload);

        assert_eq!(event.event_type, "purchase_approved");
        assert_eq!(event.webhook_id.as_deref(), Some("cakto_1"));
        assert_eq!(event.transaction_id.as_deref(), Some("ref_789"));
        assert_eq!(event.customer_email.as_deref(), Some("paula@example.com"));
        assert_eq!(event.customer_document.as_deref(), Some("11122233344"));
        assert_eq!(event.product_name.as_deref(), Some("Mentoria"));
        assert_eq!(event.offer_id.as_deref(), Some("off_c1"));
        assert_eq!(event.amount, Some(89.90));
        assert_eq!(event.payment_method.as_deref(), Some("pix"));
        assert_eq!(event.status.as_deref(), Some("approved"));
        assert_eq!(event.sales_link.as_deref(), Some("https://pay.cakto.com.br/ref_789"));
        assert_eq!(event.raw_data, payload.to_string());
    }

    #[test]
    fn commission_comes_from_first_array_element() {
        let event = extract_cakto_data(&purchase_payload());
        assert_eq!(event.commission_amount, Some(17.98));
        assert_eq!(event.affiliate_email.as_deref(), Some("parceiro@example.com"));
    }

    #[test]
    fn payment_detail_objects_are_serialized() {
        let event = extract_cakto_data(&purchase_payload());
        let details = event.payment_details.expect("pix details captured");
        assert!(details.contains("00020126PIXDATA"));

        let boleto = extract_cakto_data(&json!({
            "event": "purchase_approved",
            "data": {"boleto": {"barcode": "123"}}
        }));
        assert!(boleto.payment_details.expect("boleto").contains("barcode"));
    }

    #[test]
    fn top_level_fallback_for_older_integration() {
        let event = extract_cakto_data(&json!({
            "event": "transacao",
            "id": "legacy_1",
            "amount": 45.0,
            "status": "paid",
            "customer": {"email": "legado@example.com"}
        }));
        assert_eq!(event.webhook_id.as_deref(), Some("legacy_1"));
        assert_eq!(event.amount, Some(45.0));
        assert_eq!(event.customer_email.as_deref(), Some("legado@example.com"));
    }

    #[test]
    fn empty_commissions_leave_fields_null() {
        let event = extract_cakto_data(&json!({
            "event": "purchase_refused",
            "data": {"commissions": []}
        }));
        assert_eq!(event.commission_amount, None);
        assert_eq!(event.affiliate_email, None);
    }
}
