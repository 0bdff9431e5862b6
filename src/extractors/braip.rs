//! Braip payload extraction.
//!
//! Braip wraps the sale in `transaction`/`product`/`customer`/`affiliate`
//! envelopes but some event kinds flatten the same fields onto the top
//! level, so every envelope access carries a flat fallback. The transaction
//! value may be a formatted currency string or a raw number in either cents
//! or base units.

use serde_json::Value;

use crate::money;

use super::{CanonicalEvent, Platform, nested_str, str_field};

/// Map a Braip webhook payload into the canonical field set.
pub fn extract_braip_data(payload: &Value) -> CanonicalEvent {
    let mut event = CanonicalEvent::new(Platform::Braip, payload);

    event.webhook_id =
        nested_str(payload, &["transaction", "id"]).or_else(|| str_field(payload, "transaction_id"));
    event.transaction_id = event.webhook_id.clone();

    event.customer_email = nested_str(payload, &["customer", "email"])
        .or_else(|| str_field(payload, "customer_email"));
    event.customer_name =
        nested_str(payload, &["customer", "name"]).or_else(|| str_field(payload, "customer_name"));
    event.customer_document = nested_str(payload, &["customer", "document"])
        .or_else(|| nested_str(payload, &["customer", "cpf"]));
    event.customer_phone = nested_str(payload, &["customer", "phone"]);

    event.product_name =
        nested_str(payload, &["product", "name"]).or_else(|| str_field(payload, "product_name"));
    event.product_id =
        nested_str(payload, &["product", "id"]).or_else(|| str_field(payload, "product_id"));
    event.offer_id = str_field(payload, "offer_code");
    event.offer_name = nested_str(payload, &["product", "ucode"]);

    // String values keep their formatting rules; bare numbers go through the
    // cents-vs-units heuristic.
    event.amount = super::nested(payload, &["transaction", "value"])
        .or_else(|| payload.get("value"))
        .and_then(money::parse_amount);
    event.currency = str_field(payload, "currency").or_else(|| Some("BRL".to_string()));
    event.commission_amount = super::nested(payload, &["affiliate", "commission_amount"])
        .and_then(money::parse_amount);

    event.payment_method = nested_str(payload, &["transaction", "payment_method"])
        .or_else(|| str_field(payload, "payment_method"));
    event.status =
        nested_str(payload, &["transaction", "status"]).or_else(|| str_field(payload, "status"));

    event.affiliate_email = nested_str(payload, &["affiliate", "email"]);

    event.utm_source = str_field(payload, "utm_source");
    event.utm_medium = str_field(payload, "utm_medium");
    event.utm_campaign = str_field(payload, "utm_campaign");
    event.sales_link = str_field(payload, "sales_link");

    event.attendant_name = str_field(payload, "attendant_name");
    event.attendant_email = str_field(payload, "attendant_email");

    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enveloped_payload() -> Value {
        json!({
            "event": "purchase_complete",
            "transaction": {
                "id": "braip_tx_1",
                "value": "R$ 297,00",
                "payment_method": "boleto",
                "status": "paid",
                "installments": 1
            },
            "product": {"id": "42", "name": "Suplemento", "ucode": "abc-ucode"},
            "customer": {
                "name": "Carlos Dias",
                "email": "carlos@example.com",
                "cpf": "98765432100",
                "phone": "+5521977776666"
            },
            "affiliate": {
                "email": "afiliado@example.com",
                "commission_amount": 59.40
            },
            "utm_source": "instagram",
            "offer_code": "PROMO10"
        })
    }

    #[test]
    fn maps_enveloped_fields() {
        let event = extract_braip_data(&enveloped_payload());
        assert_eq!(event.event_type, "purchase_complete");
        assert_eq!(event.transaction_id.as_deref(), Some("braip_tx_1"));
        assert_eq!(event.customer_email.as_deref(), Some("carlos@example.com"));
        assert_eq!(event.customer_document.as_deref(), Some("98765432100"));
        assert_eq!(event.product_name.as_deref(), Some("Suplemento"));
        assert_eq!(event.amount, Some(297.0));
        assert_eq!(event.commission_amount, Some(59.40));
        assert_eq!(event.payment_method.as_deref(), Some("boleto"));
        assert_eq!(event.status.as_deref(), Some("paid"));
        assert_eq!(event.affiliate_email.as_deref(), Some("afiliado@example.com"));
        assert_eq!(event.offer_id.as_deref(), Some("PROMO10"));
        assert_eq!(event.utm_source.as_deref(), Some("instagram"));
    }

    #[test]
    fn flat_fallbacks_apply_when_envelopes_are_missing() {
        let event = extract_braip_data(&json!({
            "type": "abandoned_cart",
            "transaction_id": "flat_tx",
            "customer_email": "flat@example.com",
            "product_name": "Produto Flat",
            "status": "abandoned"
        }));
        assert_eq!(event.event_type, "abandoned_cart");
        assert_eq!(event.transaction_id.as_deref(), Some("flat_tx"));
        assert_eq!(event.customer_email.as_deref(), Some("flat@example.com"));
        assert_eq!(event.product_name.as_deref(), Some("Produto Flat"));
        assert_eq!(event.status.as_deref(), Some("abandoned"));
    }

    #[test]
    fn numeric_amount_uses_cents_heuristic() {
        let cents = extract_braip_data(&json!({"transaction": {"value": 29700}}));
        assert_eq!(cents.amount, Some(297.0));

        let units = extract_braip_data(&json!({"transaction": {"value": 297}}));
        assert_eq!(units.amount, Some(297.0));
    }

    #[test]
    fn unparsable_amount_is_null() {
        let event = extract_braip_data(&json!({"transaction": {"value": "gratis"}}));
        assert_eq!(event.amount, None);
    }
}
