//! Trailing throughput window.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::{TransactionEvent, LEDGER_EPOCH_OFFSET};

/// Default throughput window length.
pub const DEFAULT_THROUGHPUT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct ThroughputWindow {
    window_ms: i64,
}

impl ThroughputWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: i64::try_from(window.as_millis()).unwrap_or(i64::MAX).max(1),
        }
    }

    pub fn window_secs(&self) -> f64 {
        self.window_ms as f64 / 1000.0
    }

    /// Whether an event's ledger time falls strictly inside the window
    /// ending at `now`. Events without a date never do.
    pub fn contains(&self, now: DateTime<Utc>, event: &TransactionEvent) -> bool {
        let Some(date) = event.date else {
            return false;
        };
        let executed_ms = (date as i64 + LEDGER_EPOCH_OFFSET) * 1000;
        executed_ms > now.timestamp_millis().saturating_sub(self.window_ms)
    }

    pub fn count<'a>(
        &self,
        now: DateTime<Utc>,
        events: impl IntoIterator<Item = &'a TransactionEvent>,
    ) -> u64 {
        events
            .into_iter()
            .filter(|event| self.contains(now, event))
            .count() as u64
    }

    /// Transactions per second for a windowed count.
    pub fn rate(&self, count: u64) -> f64 {
        count as f64 / self.window_secs()
    }
}

impl Default for ThroughputWindow {
    fn default() -> Self {
        Self::new(DEFAULT_THROUGHPUT_WINDOW)
    }
}
