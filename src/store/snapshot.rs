//! The published read-model.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classifier::ClassifierStats;
use crate::metrics::AggregateMetrics;
use crate::model::{TransactionEvent, NATIVE_SYMBOL};
use crate::network::ConnectionStatus;

/// Bucket name for currencies folded out of [`DashboardSnapshot::top_currencies`].
pub const OTHERS_LABEL: &str = "Others";

/// Immutable view of the dashboard state after one mutation.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Bumped on every mutation.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub connection: ConnectionStatus,
    pub metrics: AggregateMetrics,
    /// Transactions per second at the last tick.
    pub throughput: f64,
    pub classifier: ClassifierStats,
    /// Most recent payments, newest first.
    pub payments: Vec<Arc<TransactionEvent>>,
    /// Most recent offers, newest first.
    pub offers: Vec<Arc<TransactionEvent>>,
}

impl DashboardSnapshot {
    /// Initial snapshot before anything happened.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            version: 0,
            updated_at: now,
            connection: ConnectionStatus::default(),
            metrics: AggregateMetrics::default(),
            throughput: 0.0,
            classifier: ClassifierStats::default(),
            payments: Vec::new(),
            offers: Vec::new(),
        }
    }

    pub fn total_transactions(&self) -> u64 {
        self.metrics.total_transactions()
    }

    /// Transactions seen in the trailing window at the last tick.
    pub fn transactions_per_minute(&self) -> u64 {
        self.metrics.recent_window_count
    }

    pub fn transactions_per_second(&self) -> f64 {
        self.throughput
    }

    pub fn unique_account_count(&self) -> usize {
        self.metrics.unique_account_count()
    }

    fn percent_of_total(&self, part: u64) -> f64 {
        match self.total_transactions() {
            0 => 0.0,
            total => part as f64 / total as f64 * 100.0,
        }
    }

    /// Payments as a percentage of payments plus offers.
    pub fn payment_share(&self) -> f64 {
        self.percent_of_total(self.metrics.payment_count)
    }

    pub fn offer_share(&self) -> f64 {
        self.percent_of_total(self.metrics.offer_count)
    }

    /// Native-asset histogram entries relative to the transaction count,
    /// capped at 100 (offers contribute two legs each).
    pub fn native_share(&self) -> f64 {
        let native = self
            .metrics
            .currency_histogram
            .get(NATIVE_SYMBOL)
            .copied()
            .unwrap_or(0);
        self.percent_of_total(native).min(100.0)
    }

    pub fn issued_share(&self) -> f64 {
        if self.total_transactions() == 0 {
            return 0.0;
        }
        100.0 - self.native_share()
    }

    /// Mean native volume per payment.
    pub fn average_payment_volume(&self) -> f64 {
        match self.metrics.payment_count {
            0 => 0.0,
            count => self.metrics.total_native_volume / count as f64,
        }
    }

    /// The `limit` most used currencies, descending, with the remainder
    /// summed under [`OTHERS_LABEL`].
    pub fn top_currencies(&self, limit: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .metrics
            .currency_histogram
            .iter()
            .map(|(currency, count)| (currency.clone(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        if entries.len() > limit {
            let others: u64 = entries.drain(limit..).map(|(_, count)| count).sum();
            entries.push((OTHERS_LABEL.to_string(), others));
        }
        entries
    }
}
