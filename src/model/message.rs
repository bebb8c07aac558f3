use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound subscribe request, re-sent on every (re)connection.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeCommand<'a> {
    pub command: &'a str,
    pub streams: &'a [&'a str],
}

impl SubscribeCommand<'static> {
    pub fn transactions() -> Self {
        Self {
            command: "subscribe",
            streams: &["transactions"],
        }
    }
}

/// Envelope of every inbound frame. Only the discriminating fields are
/// typed; the transaction payload is decoded separately so a bad payload
/// can be told apart from a bad frame.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub frame_type: Option<String>,
    #[serde(default)]
    pub transaction: Option<Value>,
}

impl InboundFrame {
    pub fn is_subscription_ack(&self) -> bool {
        self.status.as_deref() == Some("success") && self.frame_type.as_deref() == Some("response")
    }

    pub fn is_transaction(&self) -> bool {
        self.frame_type.as_deref() == Some("transaction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_wire_format() {
        let json = serde_json::to_string(&SubscribeCommand::transactions()).unwrap();
        assert_eq!(json, r#"{"command":"subscribe","streams":["transactions"]}"#);
    }

    #[test]
    fn test_frame_discrimination() {
        let ack: InboundFrame =
            serde_json::from_str(r#"{"id":1,"result":{},"status":"success","type":"response"}"#)
                .unwrap();
        assert!(ack.is_subscription_ack());
        assert!(!ack.is_transaction());

        let tx: InboundFrame = serde_json::from_str(
            r#"{"type":"transaction","validated":true,"transaction":{"TransactionType":"Payment"}}"#,
        )
        .unwrap();
        assert!(tx.is_transaction());
        assert!(tx.transaction.is_some());

        let error: InboundFrame =
            serde_json::from_str(r#"{"status":"error","type":"response","error":"slowDown"}"#)
                .unwrap();
        assert!(!error.is_subscription_ack());
    }
}
