use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amount::CurrencyAmount;

/// Seconds between the ledger epoch (2000-01-01T00:00:00Z) and the Unix epoch.
pub const LEDGER_EPOCH_OFFSET: i64 = 946_684_800;

/// Convert a ledger timestamp into wall-clock time.
pub fn ledger_time_to_utc(ledger_secs: u32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ledger_secs as i64 + LEDGER_EPOCH_OFFSET, 0)
}

/// Convert wall-clock time into ledger seconds. Times before the ledger
/// epoch clamp to zero.
pub fn utc_to_ledger_time(time: DateTime<Utc>) -> u32 {
    (time.timestamp() - LEDGER_EPOCH_OFFSET).clamp(0, u32::MAX as i64) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Payment,
    OfferCreate,
    Other,
}

impl TransactionKind {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Payment" => Self::Payment,
            "OfferCreate" => Self::OfferCreate,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "Payment",
            Self::OfferCreate => "OfferCreate",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified transaction from the live feed.
///
/// Built once by the classifier and never mutated afterwards; history and
/// snapshots share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub kind: TransactionKind,
    /// `TransactionType` as sent by the ledger (useful for `Other`).
    pub transaction_type: String,
    pub hash: Option<String>,
    pub account: Option<String>,
    /// Payment only
    pub destination: Option<String>,
    /// Payment only
    pub amount: Option<CurrencyAmount>,
    /// OfferCreate only
    pub taker_pays: Option<CurrencyAmount>,
    /// OfferCreate only
    pub taker_gets: Option<CurrencyAmount>,
    /// Seconds since the ledger epoch.
    pub date: Option<u32>,
    pub fee: Option<String>,
    pub sequence: Option<u32>,
    pub flags: Option<u32>,
    pub destination_tag: Option<u32>,
    pub source_tag: Option<u32>,
    /// Remaining transaction fields, kept for display only.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TransactionEvent {
    /// An empty event of the given kind. Mostly useful for building fixtures.
    pub fn new(kind: TransactionKind) -> Self {
        Self {
            kind,
            transaction_type: kind.as_str().to_string(),
            hash: None,
            account: None,
            destination: None,
            amount: None,
            taker_pays: None,
            taker_gets: None,
            date: None,
            fee: None,
            sequence: None,
            flags: None,
            destination_tag: None,
            source_tag: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Wall-clock time of the transaction, if the feed supplied a date.
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.date.and_then(ledger_time_to_utc)
    }

    /// Accounts this transaction touches: the sender, and for payments the
    /// destination.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        let destination = match self.kind {
            TransactionKind::Payment => self.destination.as_deref(),
            _ => None,
        };
        self.account.as_deref().into_iter().chain(destination)
    }

    /// Histogram labels contributed by this transaction.
    pub fn currency_labels(&self) -> impl Iterator<Item = &str> {
        let legs: [Option<&CurrencyAmount>; 2] = match self.kind {
            TransactionKind::Payment => [self.amount.as_ref(), None],
            TransactionKind::OfferCreate => [self.taker_pays.as_ref(), self.taker_gets.as_ref()],
            TransactionKind::Other => [None, None],
        };
        legs.into_iter().flatten().map(CurrencyAmount::currency_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_epoch_offset() {
        let epoch = ledger_time_to_utc(0).unwrap();
        assert_eq!(epoch.to_rfc3339(), "2000-01-01T00:00:00+00:00");
        assert_eq!(utc_to_ledger_time(epoch), 0);

        let later = ledger_time_to_utc(750_000_000).unwrap();
        assert_eq!(utc_to_ledger_time(later), 750_000_000);
    }

    #[test]
    fn test_kind_dispatch() {
        assert_eq!(TransactionKind::from_type_name("Payment"), TransactionKind::Payment);
        assert_eq!(TransactionKind::from_type_name("OfferCreate"), TransactionKind::OfferCreate);
        assert_eq!(TransactionKind::from_type_name("TrustSet"), TransactionKind::Other);
    }

    #[test]
    fn test_participants_only_include_destination_for_payments() {
        let mut payment = TransactionEvent::new(TransactionKind::Payment);
        payment.account = Some("rA".into());
        payment.destination = Some("rB".into());
        assert_eq!(payment.participants().collect::<Vec<_>>(), vec!["rA", "rB"]);

        let mut offer = TransactionEvent::new(TransactionKind::OfferCreate);
        offer.account = Some("rC".into());
        offer.destination = Some("rD".into());
        assert_eq!(offer.participants().collect::<Vec<_>>(), vec!["rC"]);
    }

    #[test]
    fn test_offer_contributes_both_legs() {
        let mut offer = TransactionEvent::new(TransactionKind::OfferCreate);
        offer.taker_pays = Some(CurrencyAmount::native(10));
        offer.taker_gets = Some(CurrencyAmount::issued("1", "USD", Some("rI")));
        assert_eq!(offer.currency_labels().collect::<Vec<_>>(), vec!["XRP", "USD"]);
    }
}
