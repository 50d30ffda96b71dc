//! Pure conversions from loosely-typed external input (query strings, form
//! fields, gateway payloads) into validated domain values.

use {
    super::{error::BridgeError, money::Amount},
    serde_json::Value,
};

/// Candidate field names for the paid amount in a gateway payload, in
/// precedence order. `DebitTotal` is what current responses carry; the
/// rest show up in older response shapes.
const AMOUNT_FIELDS: &[&str] = &["DebitTotal", "Total", "Amount"];

/// Candidate field names for the installment count, in precedence order.
const PAYMENT_COUNT_FIELDS: &[&str] = &["TotalPayments", "Payments", "PaymentsCount"];

pub fn amount(raw: Option<&str>) -> Result<Amount, BridgeError> {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => Amount::parse_major(s),
        _ => Err(BridgeError::Validation("amount invalid".into())),
    }
}

/// Installment count. Anything unparseable or non-positive falls back to a
/// single payment; a bad count must never block receipt issuance.
pub fn payment_count(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as u32)
        .unwrap_or(1)
}

pub fn phone(raw: Option<&str>) -> Result<String, BridgeError> {
    let digits: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Err(BridgeError::Validation("phone required".into()));
    }
    Ok(digits)
}

fn field_as_i64(payload: &Value, name: &str) -> Option<i64> {
    match payload.get(name)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Minor-unit amount from whichever candidate field the gateway used.
/// The first field that parses wins; 0 when nothing matches.
pub fn amount_minor_units(payload: &Value) -> i64 {
    AMOUNT_FIELDS
        .iter()
        .find_map(|field| field_as_i64(payload, field))
        .unwrap_or(0)
}

/// Installment count from whichever candidate field the gateway used;
/// defaults to a single payment.
pub fn payment_count_from(payload: &Value) -> u32 {
    PAYMENT_COUNT_FIELDS
        .iter()
        .find_map(|field| field_as_i64(payload, field))
        .filter(|n| *n > 0)
        .map(|n| n as u32)
        .unwrap_or(1)
}
