//! Event classification.
//!
//! Turns raw text frames from the feed into typed [`TransactionEvent`]s.
//! The feed is untrusted: anything that cannot be understood is counted,
//! logged and dropped here, so nothing downstream ever sees a raw parse
//! failure.

pub mod rules;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::model::{InboundFrame, TransactionEvent, TransactionKind};

/// Why a frame was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Not valid JSON, or not a JSON object.
    InvalidJson(String),
    /// A transaction frame without a transaction object.
    MissingTransaction,
    /// A transaction without a string `TransactionType`.
    MissingTransactionType,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(e) => write!(f, "invalid JSON: {}", e),
            Self::MissingTransaction => write!(f, "transaction frame without payload"),
            Self::MissingTransactionType => write!(f, "missing TransactionType"),
        }
    }
}

/// Outcome of classifying one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Subscription acknowledgement. Consumed, produces no event.
    Acknowledged,
    /// A transaction to hand to the store.
    Event(TransactionEvent),
    /// Well-formed but of no interest (other frame types, unforwarded
    /// transaction types).
    Ignored,
    Rejected(RejectReason),
}

/// Running counters of classification outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassifierStats {
    pub acknowledged: u64,
    pub accepted: u64,
    pub ignored: u64,
    pub rejected: u64,
}

pub struct EventClassifier {
    forward_other: bool,
    stats: ClassifierStats,
}

impl EventClassifier {
    /// `forward_other` controls whether transaction types other than
    /// Payment and OfferCreate become events or are ignored.
    pub fn new(forward_other: bool) -> Self {
        Self {
            forward_other,
            stats: ClassifierStats::default(),
        }
    }

    pub fn stats(&self) -> ClassifierStats {
        self.stats
    }

    pub fn classify(&mut self, raw: &str) -> Classification {
        let result = self.classify_inner(raw);
        match &result {
            Classification::Acknowledged => self.stats.acknowledged += 1,
            Classification::Event(_) => self.stats.accepted += 1,
            Classification::Ignored => self.stats.ignored += 1,
            Classification::Rejected(reason) => {
                self.stats.rejected += 1;
                warn!("Rejected frame ({}): {}", reason, preview(raw));
            }
        }
        result
    }

    fn classify_inner(&self, raw: &str) -> Classification {
        let frame: InboundFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(e) => return Classification::Rejected(RejectReason::InvalidJson(e.to_string())),
        };

        if frame.is_subscription_ack() {
            info!("Subscribed to transaction stream");
            return Classification::Acknowledged;
        }

        if !frame.is_transaction() {
            debug!(
                "Ignoring frame type={:?} status={:?}",
                frame.frame_type, frame.status
            );
            return Classification::Ignored;
        }

        let tx = match frame.transaction {
            Some(Value::Object(tx)) => tx,
            _ => return Classification::Rejected(RejectReason::MissingTransaction),
        };

        let transaction_type = match tx.get("TransactionType").and_then(Value::as_str) {
            Some(t) => t,
            None => return Classification::Rejected(RejectReason::MissingTransactionType),
        };

        if TransactionKind::from_type_name(transaction_type) == TransactionKind::Other
            && !self.forward_other
        {
            trace!("Dropping unforwarded {} transaction", transaction_type);
            return Classification::Ignored;
        }

        Classification::Event(rules::build_event(&tx, transaction_type))
    }
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(false)
    }
}

/// First few characters of a frame, for log lines.
fn preview(raw: &str) -> &str {
    match raw.char_indices().nth(120) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CurrencyAmount;

    const PAYMENT: &str = r#"{"type":"transaction","validated":true,"transaction":{
        "TransactionType":"Payment","hash":"H1","Account":"rA","Destination":"rB",
        "Amount":"1000000","date":780000000}}"#;

    #[test]
    fn test_ack_produces_no_event() {
        let mut classifier = EventClassifier::default();
        let result = classifier.classify(r#"{"result":{},"status":"success","type":"response"}"#);
        assert_eq!(result, Classification::Acknowledged);
        assert_eq!(classifier.stats().acknowledged, 1);
    }

    #[test]
    fn test_payment_is_classified() {
        let mut classifier = EventClassifier::default();
        match classifier.classify(PAYMENT) {
            Classification::Event(event) => {
                assert_eq!(event.kind, TransactionKind::Payment);
                assert_eq!(event.amount, Some(CurrencyAmount::native(1_000_000)));
            }
            other => panic!("Expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_frames_are_rejected() {
        let mut classifier = EventClassifier::default();

        assert!(matches!(
            classifier.classify("not json at all"),
            Classification::Rejected(RejectReason::InvalidJson(_))
        ));
        assert!(matches!(
            classifier.classify(r#"{"type":"transaction","transaction":{"Account":"rA"}}"#),
            Classification::Rejected(RejectReason::MissingTransactionType)
        ));
        assert!(matches!(
            classifier.classify(r#"{"type":"transaction"}"#),
            Classification::Rejected(RejectReason::MissingTransaction)
        ));
        assert!(matches!(
            classifier.classify(r#"[1,2,3]"#),
            Classification::Rejected(RejectReason::InvalidJson(_))
        ));
        assert!(matches!(classifier.classify(PAYMENT), Classification::Event(_)));

        let stats = classifier.stats();
        assert_eq!(stats.rejected, 4);
        assert_eq!(stats.accepted, 1);
    }

    #[test]
    fn test_other_transactions_need_forwarding() {
        let raw = r#"{"type":"transaction","transaction":{"TransactionType":"TrustSet","Account":"rA"}}"#;

        let mut dropping = EventClassifier::new(false);
        assert_eq!(dropping.classify(raw), Classification::Ignored);

        let mut forwarding = EventClassifier::new(true);
        match forwarding.classify(raw) {
            Classification::Event(event) => {
                assert_eq!(event.kind, TransactionKind::Other);
                assert_eq!(event.transaction_type, "TrustSet");
            }
            other => panic!("Expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_unrelated_frames_are_ignored() {
        let mut classifier = EventClassifier::default();
        let raw = r#"{"type":"ledgerClosed","ledger_index":90000000}"#;
        assert_eq!(classifier.classify(raw), Classification::Ignored);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(200);
        assert_eq!(preview(&long).chars().count(), 120);
        assert_eq!(preview("short"), "short");
    }
}
