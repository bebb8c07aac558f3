//! Connection state reported to consumers.

use serde::Serialize;

/// Lifecycle of the upstream connection.
///
/// Each connection attempt moves forward through `Connecting` and
/// `Connected` to `Disconnected` or `Error`; the manager then starts over
/// with a new attempt, so the overall sequence cycles indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
    /// Connected, but no transaction arrived within the throughput window.
    /// Only the session driver sets this.
    Idle,
}

impl ConnectionState {
    /// Whether the socket is believed to be up.
    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connected | Self::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
            Self::Idle => "idle",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A state plus an optional diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub message: Option<String>,
}

impl ConnectionStatus {
    pub fn new(state: ConnectionState) -> Self {
        Self { state, message: None }
    }

    pub fn with_message(state: ConnectionState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: Some(message.into()),
        }
    }

    pub fn connecting() -> Self {
        Self::new(ConnectionState::Connecting)
    }

    pub fn connected() -> Self {
        Self::new(ConnectionState::Connected)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_message(ConnectionState::Error, message)
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::connecting()
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({})", self.state, message),
            None => write!(f, "{}", self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness() {
        assert!(ConnectionState::Connected.is_live());
        assert!(ConnectionState::Idle.is_live());
        assert!(!ConnectionState::Connecting.is_live());
        assert!(!ConnectionState::Error.is_live());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionStatus::connected().to_string(), "connected");
        assert_eq!(
            ConnectionStatus::error("refused").to_string(),
            "error (refused)"
        );
    }
}
