//! Monetary coercion helpers.
//!
//! Upstream platforms disagree on how money looks on the wire: localized
//! currency strings (`"R$ 169,80"`), plain floats, or integer cents. These
//! helpers map all of them to an `Option<f64>` in base currency units and
//! never fail — an unparseable value is `None`, and aggregation downstream
//! coalesces `None` to zero.

use serde_json::Value;

/// Numeric values strictly above this magnitude are assumed to be integer
/// cents. Values between 1000 and ~100000 base units are silently
/// misclassified by this guess; platforms that declare their unit (Hubla v2)
/// bypass it via [`cents_to_units`].
pub const CENTS_THRESHOLD: f64 = 1000.0;

/// Coerce an arbitrary JSON value into an amount in base currency units.
///
/// Strings go through [`parse_money_str`]; numbers through the
/// cents-vs-units heuristic. Everything else is `None`.
pub fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::String(raw) => parse_money_str(raw),
        Value::Number(n) => n.as_f64().map(coerce_units),
        _ => None,
    }
}

/// Parse a textual monetary representation.
///
/// Strips currency symbols and whitespace, then handles the pt-BR convention:
/// when a decimal comma is present, `.` is a thousands separator
/// (`"R$ 1.234,56"` → `1234.56`). Strings are taken at face value — the
/// cents heuristic applies to bare numbers only.
pub fn parse_money_str(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .replace("R$", "")
        .replace('$', "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Magnitude-based cents-vs-units guess for numeric inputs.
pub fn coerce_units(value: f64) -> f64 {
    if value.abs() > CENTS_THRESHOLD {
        value / 100.0
    } else {
        value
    }
}

/// Convert a value declared in integer cents to base units. No guessing.
pub fn cents_to_units(cents: f64) -> f64 {
    cents / 100.0
}

/// Extract an amount from a JSON field known to be denominated in cents.
pub fn parse_cents(value: &Value) -> Option<f64> {
    value.as_f64().map(cents_to_units)
}
