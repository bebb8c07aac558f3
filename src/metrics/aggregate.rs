//! Aggregate counters published to consumers.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// Largest native-equivalent payment seen so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LargestTransaction {
    /// Native display units
    pub amount: f64,
    pub hash: Option<String>,
}

/// A payment above the large-payment threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LargePayment {
    /// Native display units
    pub amount: f64,
    pub hash: Option<String>,
    pub account: Option<String>,
    pub destination: Option<String>,
}

/// Running metrics for the live feed.
///
/// Counts, volume, histogram and largest transaction are lifetime values and
/// only ever grow. `unique_accounts` and `recent_window_count` are derived
/// from the retained history on each tick and can shrink.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateMetrics {
    pub payment_count: u64,
    pub offer_count: u64,
    pub other_count: u64,
    /// Sum of native-equivalent payment amounts, in display units.
    pub total_native_volume: f64,
    pub currency_histogram: HashMap<String, u64>,
    pub unique_accounts: HashSet<String>,
    pub largest_transaction: Option<LargestTransaction>,
    /// Payments and offers inside the trailing throughput window at the last tick.
    pub recent_window_count: u64,
    /// Highest transactions-per-second observed at any tick.
    pub peak_throughput: f64,
    pub large_payment_count: u64,
    pub latest_large_payment: Option<LargePayment>,
}

impl AggregateMetrics {
    /// Payments plus offers.
    pub fn total_transactions(&self) -> u64 {
        self.payment_count + self.offer_count
    }

    pub fn unique_account_count(&self) -> usize {
        self.unique_accounts.len()
    }

    pub fn currency_count(&self) -> usize {
        self.currency_histogram.len()
    }
}

impl std::fmt::Display for AggregateMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "payments: {}, offers: {}, volume: {:.2} XRP, currencies: {}, accounts: {}, last minute: {}, peak: {:.2} tps",
            self.payment_count,
            self.offer_count,
            self.total_native_volume,
            self.currency_count(),
            self.unique_account_count(),
            self.recent_window_count,
            self.peak_throughput
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let metrics = AggregateMetrics {
            payment_count: 3,
            offer_count: 4,
            other_count: 9,
            ..Default::default()
        };
        assert_eq!(metrics.total_transactions(), 7);
    }

    #[test]
    fn test_display() {
        let metrics = AggregateMetrics {
            payment_count: 12,
            total_native_volume: 1234.5,
            peak_throughput: 0.5,
            ..Default::default()
        };
        let s = format!("{}", metrics);
        assert!(s.contains("payments: 12"));
        assert!(s.contains("1234.50 XRP"));
        assert!(s.contains("0.50 tps"));
    }
}
