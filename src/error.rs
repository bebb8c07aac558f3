use thiserror::Error;

/// Errors surfaced at construction time. Runtime feed failures become
/// connection status transitions instead.
#[derive(Error, Debug)]
pub enum LedgerFlowError {
    /// The upstream endpoint could not be reached.
    #[error("Network connection failed: {0}")]
    ConnectionError(String),

    /// Handshake or transport failure reported by the socket library.
    #[error("WebSocket error: {0}")]
    SocketError(#[from] tokio_tungstenite::tungstenite::Error),

    /// The subscribe command could not be serialized.
    #[error("Failed to serialize or parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The session driver is gone; no further snapshots will arrive.
    #[error("Snapshot channel closed")]
    ChannelClosed,

    /// The configured endpoint is not a valid URL.
    #[error("Invalid endpoint URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// A `FeedConfig` value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LedgerFlowError>;
