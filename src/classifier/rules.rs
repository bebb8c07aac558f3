//! Field extraction rules for transaction payloads.
//!
//! The transaction object is loosely typed on the wire: amounts are either a
//! string of drops or an object, and numeric fields occasionally show up in
//! unexpected shapes. These rules pull out what the engine understands and
//! leave everything else in the passthrough map.

use serde_json::{Map, Value};
use tracing::warn;

use crate::model::{CurrencyAmount, TransactionEvent, TransactionKind};

/// Fields lifted into typed slots on [`TransactionEvent`].
const TYPED_FIELDS: &[&str] = &[
    "TransactionType",
    "hash",
    "Account",
    "Destination",
    "Amount",
    "TakerPays",
    "TakerGets",
    "Fee",
    "Sequence",
    "date",
    "Flags",
    "DestinationTag",
    "SourceTag",
];

/// Resolve a raw amount field.
///
/// An object carrying a `currency` is an issued amount; any other present
/// value is the native asset, kept as its wire text. Whether the drops
/// actually parse is decided later by
/// [`CurrencyAmount::native_equivalent`]. `null`, `false` and the empty
/// string mean no amount.
pub fn parse_amount(raw: &Value) -> Option<CurrencyAmount> {
    match raw {
        Value::Null | Value::Bool(false) => None,
        Value::String(drops) if drops.is_empty() => None,
        Value::String(drops) => Some(CurrencyAmount::native_text(drops.as_str())),
        Value::Number(drops) => Some(CurrencyAmount::native_text(drops.to_string())),
        Value::Object(obj) => match obj.get("currency").and_then(Value::as_str) {
            Some(currency) => {
                let value = match obj.get("value") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => String::new(),
                };
                let issuer = obj.get("issuer").and_then(Value::as_str);
                Some(CurrencyAmount::issued(value, currency, issuer))
            }
            None => Some(CurrencyAmount::native_text(raw.to_string())),
        },
        other => Some(CurrencyAmount::native_text(other.to_string())),
    }
}

fn amount_field(tx: &Map<String, Value>, field: &str, hash: Option<&str>) -> Option<CurrencyAmount> {
    let raw = tx.get(field)?;
    if !matches!(raw, Value::String(_) | Value::Object(_) | Value::Null) {
        warn!(
            "Unexpected {} shape on {}: {}",
            field,
            hash.unwrap_or("<no hash>"),
            raw
        );
    }
    parse_amount(raw)
}

fn string_field(tx: &Map<String, Value>, field: &str) -> Option<String> {
    tx.get(field).and_then(Value::as_str).map(str::to_string)
}

fn u32_field(tx: &Map<String, Value>, field: &str) -> Option<u32> {
    tx.get(field)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}

/// Fee is usually a drops string but accept a bare number too.
fn fee_field(tx: &Map<String, Value>) -> Option<String> {
    match tx.get("Fee")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Build an event from a transaction object whose type has already been
/// read. Kind-specific fields are only populated for the matching kind.
pub fn build_event(tx: &Map<String, Value>, transaction_type: &str) -> TransactionEvent {
    let kind = TransactionKind::from_type_name(transaction_type);
    let hash = string_field(tx, "hash");

    let mut event = TransactionEvent::new(kind);
    event.transaction_type = transaction_type.to_string();
    event.account = string_field(tx, "Account");
    event.date = u32_field(tx, "date");
    event.fee = fee_field(tx);
    event.sequence = u32_field(tx, "Sequence");
    event.flags = u32_field(tx, "Flags");
    event.destination_tag = u32_field(tx, "DestinationTag");
    event.source_tag = u32_field(tx, "SourceTag");

    match kind {
        TransactionKind::Payment => {
            event.destination = string_field(tx, "Destination");
            event.amount = amount_field(tx, "Amount", hash.as_deref());
        }
        TransactionKind::OfferCreate => {
            event.taker_pays = amount_field(tx, "TakerPays", hash.as_deref());
            event.taker_gets = amount_field(tx, "TakerGets", hash.as_deref());
        }
        TransactionKind::Other => {}
    }

    event.extra = tx
        .iter()
        .filter(|(key, _)| !TYPED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    event.hash = hash;
    event
}
