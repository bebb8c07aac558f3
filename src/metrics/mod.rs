//! Live metrics aggregation.
//!
//! The aggregator is fed every classified transaction through
//! [`MetricsAggregator::apply_event`] and a periodic [`MetricsAggregator::tick`].
//! Events update lifetime counters immediately; the tick re-derives the
//! window-based values (throughput, unique accounts) from the retained
//! history.
//!
//! After a tick, `unique_accounts` holds only the accounts present in the
//! bounded history, not every account ever seen; it under-counts on busy
//! feeds.

mod aggregate;
mod window;

pub use aggregate::{AggregateMetrics, LargePayment, LargestTransaction};
pub use window::{ThroughputWindow, DEFAULT_THROUGHPUT_WINDOW};

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::history::HistoryBuffer;
use crate::model::{TransactionEvent, TransactionKind};

/// Default native-equivalent amount above which a payment is flagged.
pub const DEFAULT_LARGE_PAYMENT_THRESHOLD: f64 = 1000.0;

pub struct MetricsAggregator {
    metrics: AggregateMetrics,
    window: ThroughputWindow,
    large_payment_threshold: f64,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_THROUGHPUT_WINDOW, DEFAULT_LARGE_PAYMENT_THRESHOLD)
    }

    pub fn with_settings(window: Duration, large_payment_threshold: f64) -> Self {
        Self {
            metrics: AggregateMetrics::default(),
            window: ThroughputWindow::new(window),
            large_payment_threshold,
        }
    }

    pub fn metrics(&self) -> &AggregateMetrics {
        &self.metrics
    }

    pub fn window(&self) -> &ThroughputWindow {
        &self.window
    }

    /// Current transactions per second from the last tick.
    pub fn throughput(&self) -> f64 {
        self.window.rate(self.metrics.recent_window_count)
    }

    /// Fold one transaction into the running metrics.
    ///
    /// Never fails: an amount that cannot be converted still counts the
    /// event, only the volume and largest-transaction updates are skipped.
    pub fn apply_event(&mut self, event: &TransactionEvent) {
        match event.kind {
            TransactionKind::Payment => self.metrics.payment_count += 1,
            TransactionKind::OfferCreate => self.metrics.offer_count += 1,
            TransactionKind::Other => self.metrics.other_count += 1,
        }

        for label in event.currency_labels() {
            *self
                .metrics
                .currency_histogram
                .entry(label.to_string())
                .or_insert(0) += 1;
        }

        for account in event.participants() {
            if !self.metrics.unique_accounts.contains(account) {
                self.metrics.unique_accounts.insert(account.to_string());
            }
        }

        if event.kind != TransactionKind::Payment {
            return;
        }
        let Some(amount) = &event.amount else {
            return;
        };

        match amount.native_equivalent() {
            Ok(Some(native)) => self.record_native_payment(native, event),
            Ok(None) => {}
            Err(e) => warn!(
                "Skipping volume for payment {}: {}",
                event.hash.as_deref().unwrap_or("<no hash>"),
                e
            ),
        }
    }

    fn record_native_payment(&mut self, amount: f64, event: &TransactionEvent) {
        self.metrics.total_native_volume += amount;

        // Strictly greater: on ties the first payment keeps the record.
        let is_largest = self
            .metrics
            .largest_transaction
            .as_ref()
            .map_or(true, |largest| amount > largest.amount);
        if is_largest {
            self.metrics.largest_transaction = Some(LargestTransaction {
                amount,
                hash: event.hash.clone(),
            });
        }

        if amount > self.large_payment_threshold {
            info!(
                "Large payment: {:.2} XRP from {} to {}",
                amount,
                event.account.as_deref().unwrap_or("?"),
                event.destination.as_deref().unwrap_or("?")
            );
            self.metrics.large_payment_count += 1;
            self.metrics.latest_large_payment = Some(LargePayment {
                amount,
                hash: event.hash.clone(),
                account: event.account.clone(),
                destination: event.destination.clone(),
            });
        }
    }

    /// Re-derive the windowed values from the retained history.
    pub fn tick(&mut self, now: DateTime<Utc>, history: &HistoryBuffer) {
        let recent = self.window.count(now, history.iter_all());
        self.metrics.recent_window_count = recent;

        let rate = self.window.rate(recent);
        if rate > self.metrics.peak_throughput {
            self.metrics.peak_throughput = rate;
        }

        let accounts: HashSet<String> = history
            .iter_all()
            .flat_map(|event| event.participants())
            .map(str::to_string)
            .collect();
        self.metrics.unique_accounts = accounts;
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
