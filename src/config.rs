//! Feed configuration with tunable defaults.

use std::time::Duration;

use tracing::warn;

use crate::error::{LedgerFlowError, Result};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::metrics::{DEFAULT_LARGE_PAYMENT_THRESHOLD, DEFAULT_THROUGHPUT_WINDOW};

/// Public XRP Ledger WebSocket endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://s1.ripple.com:443";

/// Configuration for a dashboard session.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// WebSocket endpoint (default: public s1 cluster)
    pub endpoint: String,
    /// Delay before each reconnection attempt (default: 5s)
    pub reconnect_delay: Duration,
    /// Period of the metrics tick (default: 3s)
    pub tick_interval: Duration,
    /// Trailing window for throughput (default: 60s)
    pub throughput_window: Duration,
    /// Retained events per history category (default: 100)
    pub history_capacity: usize,
    /// Capacity of the feed event channel (default: 100)
    pub event_channel_capacity: usize,
    /// Forward transaction types other than Payment/OfferCreate (default: false)
    pub forward_other_transactions: bool,
    /// Native amount above which a payment is flagged (default: 1000 XRP)
    pub large_payment_threshold: f64,
    /// Demote Connected to Idle when the window is empty (default: true)
    pub idle_demotion: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reconnect_delay: Duration::from_secs(5),
            tick_interval: Duration::from_secs(3),
            throughput_window: DEFAULT_THROUGHPUT_WINDOW,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            event_channel_capacity: 100,
            forward_other_transactions: false,
            large_payment_threshold: DEFAULT_LARGE_PAYMENT_THRESHOLD,
            idle_demotion: true,
        }
    }
}

impl FeedConfig {
    pub fn builder() -> FeedConfigBuilder {
        FeedConfigBuilder::default()
    }

    /// Load configuration from environment variables on top of defaults.
    ///
    /// - `LEDGER_WS_URL`
    /// - `LEDGER_RECONNECT_DELAY_SECS`
    /// - `LEDGER_TICK_INTERVAL_SECS`
    /// - `LEDGER_HISTORY_CAPACITY`
    /// - `LEDGER_FORWARD_OTHER`
    /// - `LEDGER_LARGE_PAYMENT_XRP`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FeedConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("LEDGER_WS_URL") {
            config.endpoint = url;
        }
        if let Some(secs) = parse_var(&lookup, "LEDGER_RECONNECT_DELAY_SECS") {
            config.reconnect_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "LEDGER_TICK_INTERVAL_SECS") {
            config.tick_interval = Duration::from_secs(secs);
        }
        if let Some(capacity) = parse_var(&lookup, "LEDGER_HISTORY_CAPACITY") {
            config.history_capacity = capacity;
        }
        if let Some(forward) = parse_var(&lookup, "LEDGER_FORWARD_OTHER") {
            config.forward_other_transactions = forward;
        }
        if let Some(threshold) = parse_var(&lookup, "LEDGER_LARGE_PAYMENT_XRP") {
            config.large_payment_threshold = threshold;
        }

        config
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.endpoint)?;
        if self.tick_interval.is_zero() {
            return Err(LedgerFlowError::InvalidConfig("tick interval must be non-zero".into()));
        }
        if self.throughput_window.is_zero() {
            return Err(LedgerFlowError::InvalidConfig(
                "throughput window must be non-zero".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(LedgerFlowError::InvalidConfig("history capacity must be at least 1".into()));
        }
        if self.event_channel_capacity == 0 {
            return Err(LedgerFlowError::InvalidConfig(
                "event channel capacity must be at least 1".into(),
            ));
        }
        if !self.large_payment_threshold.is_finite() {
            return Err(LedgerFlowError::InvalidConfig(
                "large payment threshold must be finite".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}

/// Builder pattern for FeedConfig.
#[derive(Default)]
pub struct FeedConfigBuilder {
    config: FeedConfig,
}

impl FeedConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = interval;
        self
    }

    pub fn throughput_window(mut self, window: Duration) -> Self {
        self.config.throughput_window = window;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity;
        self
    }

    pub fn forward_other_transactions(mut self, forward: bool) -> Self {
        self.config.forward_other_transactions = forward;
        self
    }

    pub fn large_payment_threshold(mut self, threshold: f64) -> Self {
        self.config.large_payment_threshold = threshold;
        self
    }

    pub fn idle_demotion(mut self, enable: bool) -> Self {
        self.config.idle_demotion = enable;
        self
    }

    pub fn build(self) -> FeedConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = FeedConfig::default();
        assert_eq!(config.endpoint, "wss://s1.ripple.com:443");
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.history_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = FeedConfig::builder()
            .endpoint("ws://127.0.0.1:6006")
            .reconnect_delay(Duration::from_millis(250))
            .history_capacity(10)
            .forward_other_transactions(true)
            .build();

        assert_eq!(config.endpoint, "ws://127.0.0.1:6006");
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.history_capacity, 10);
        assert!(config.forward_other_transactions);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("LEDGER_WS_URL", "wss://xrplcluster.com"),
            ("LEDGER_RECONNECT_DELAY_SECS", "9"),
            ("LEDGER_HISTORY_CAPACITY", "not-a-number"),
            ("LEDGER_FORWARD_OTHER", "true"),
            ("LEDGER_LARGE_PAYMENT_XRP", "250.5"),
        ]);
        let config = FeedConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.endpoint, "wss://xrplcluster.com");
        assert_eq!(config.reconnect_delay, Duration::from_secs(9));
        assert_eq!(config.history_capacity, 100);
        assert!(config.forward_other_transactions);
        assert_eq!(config.large_payment_threshold, 250.5);
    }

    #[test]
    fn test_validation() {
        let bad_url = FeedConfig::builder().endpoint("not a url").build();
        assert!(matches!(bad_url.validate(), Err(LedgerFlowError::UrlParseError(_))));

        let no_history = FeedConfig::builder().history_capacity(0).build();
        assert!(matches!(no_history.validate(), Err(LedgerFlowError::InvalidConfig(_))));

        let no_tick = FeedConfig::builder().tick_interval(Duration::ZERO).build();
        assert!(no_tick.validate().is_err());
    }
}
