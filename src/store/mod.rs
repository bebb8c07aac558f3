//! The dashboard state store.
//!
//! [`DashboardStore`] owns the classifier, the aggregator, the history
//! buffer and the connection status. It is mutated only through
//! `on_connection_state`, `on_frame`/`on_event` and `on_tick`, which take
//! `&mut self`; whoever owns the store (normally the session driver task)
//! is the single writer. Every mutation publishes a fresh immutable
//! [`DashboardSnapshot`] to listeners and to a `watch` channel for
//! consumers that poll.

mod listeners;
mod snapshot;

pub use listeners::{Listener, Subscription};
pub use snapshot::{DashboardSnapshot, OTHERS_LABEL};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use crate::classifier::{Classification, EventClassifier};
use crate::config::FeedConfig;
use crate::error::{LedgerFlowError, Result};
use crate::history::{HistoryBuffer, HistoryCategory};
use crate::metrics::{AggregateMetrics, MetricsAggregator};
use crate::model::TransactionEvent;
use crate::network::ConnectionStatus;

use listeners::ListenerRegistry;

pub struct DashboardStore {
    classifier: EventClassifier,
    aggregator: MetricsAggregator,
    history: HistoryBuffer,
    connection: ConnectionStatus,
    version: u64,
    publisher: watch::Sender<Arc<DashboardSnapshot>>,
    listeners: ListenerRegistry,
}

impl DashboardStore {
    pub fn new(config: &FeedConfig) -> Self {
        let (publisher, _) = watch::channel(Arc::new(DashboardSnapshot::empty(Utc::now())));
        Self {
            classifier: EventClassifier::new(config.forward_other_transactions),
            aggregator: MetricsAggregator::with_settings(
                config.throughput_window,
                config.large_payment_threshold,
            ),
            history: HistoryBuffer::with_capacity(config.history_capacity),
            connection: ConnectionStatus::default(),
            version: 0,
            publisher,
            listeners: ListenerRegistry::default(),
        }
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    pub fn metrics(&self) -> &AggregateMetrics {
        self.aggregator.metrics()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn on_connection_state(&mut self, status: ConnectionStatus) {
        debug!("Connection status: {}", status);
        self.connection = status;
        self.publish(Utc::now());
    }

    /// Classify a raw feed frame and apply it if it is a transaction.
    /// Returns whether an event was applied.
    pub fn on_frame(&mut self, raw: &str) -> bool {
        match self.classifier.classify(raw) {
            Classification::Event(event) => {
                self.on_event(event);
                true
            }
            Classification::Acknowledged | Classification::Ignored | Classification::Rejected(_) => {
                false
            }
        }
    }

    /// Apply one classified transaction: metrics first, then history.
    pub fn on_event(&mut self, event: TransactionEvent) {
        self.aggregator.apply_event(&event);
        if let Some(category) = HistoryCategory::from_kind(event.kind) {
            self.history.push(category, Arc::new(event));
        }
        self.publish(Utc::now());
    }

    /// Recompute the window-derived metrics as of `now`.
    pub fn on_tick(&mut self, now: DateTime<Utc>) {
        self.aggregator.tick(now, &self.history);
        self.publish(now);
    }

    /// Register a listener called after every mutation, in registration order.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<DashboardSnapshot>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn current_snapshot(&self) -> Arc<DashboardSnapshot> {
        Arc::clone(&self.publisher.borrow())
    }

    /// A read-only handle usable from other tasks.
    pub fn handle(&self) -> StoreHandle {
        StoreHandle {
            snapshots: self.publisher.subscribe(),
            listeners: self.listeners.clone(),
        }
    }

    fn build_snapshot(&self, now: DateTime<Utc>) -> DashboardSnapshot {
        DashboardSnapshot {
            version: self.version,
            updated_at: now,
            connection: self.connection.clone(),
            metrics: self.aggregator.metrics().clone(),
            throughput: self.aggregator.throughput(),
            classifier: self.classifier.stats(),
            payments: self.history.snapshot(HistoryCategory::Payment),
            offers: self.history.snapshot(HistoryCategory::OfferCreate),
        }
    }

    fn publish(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        let snapshot = Arc::new(self.build_snapshot(now));
        self.publisher.send_replace(Arc::clone(&snapshot));
        self.listeners.notify(&snapshot);
    }
}

/// Cloneable read access to a [`DashboardStore`].
#[derive(Clone)]
pub struct StoreHandle {
    snapshots: watch::Receiver<Arc<DashboardSnapshot>>,
    listeners: ListenerRegistry,
}

impl StoreHandle {
    pub fn current_snapshot(&self) -> Arc<DashboardSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<DashboardSnapshot>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    /// Wait for the next snapshot. Fails once the store is gone.
    pub async fn changed(&mut self) -> Result<Arc<DashboardSnapshot>> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| LedgerFlowError::ChannelClosed)?;
        Ok(Arc::clone(&self.snapshots.borrow_and_update()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ledger_time_to_utc, TransactionKind};
    use crate::network::ConnectionState;
    use parking_lot::Mutex;

    const PAYMENT: &str = r#"{"type":"transaction","transaction":{"TransactionType":"Payment",
        "hash":"P1","Account":"rA","Destination":"rB","Amount":"3000000","date":780000000}}"#;

    fn store() -> DashboardStore {
        DashboardStore::new(&FeedConfig::default())
    }

    #[test]
    fn test_malformed_input_applies_exactly_one_event() {
        let mut store = store();
        assert!(!store.on_frame("}{ definitely not json"));
        assert!(!store.on_frame(r#"{"type":"transaction","transaction":{"Account":"rA"}}"#));
        assert!(store.on_frame(PAYMENT));

        let snapshot = store.current_snapshot();
        assert_eq!(snapshot.metrics.payment_count, 1);
        assert_eq!(snapshot.payments.len(), 1);
        assert_eq!(snapshot.classifier.rejected, 2);
        assert_eq!(snapshot.metrics.total_native_volume, 3.0);
    }

    #[test]
    fn test_unparsable_native_amount_still_counts_xrp() {
        let mut store = store();
        assert!(store.on_frame(
            r#"{"type":"transaction","transaction":{"TransactionType":"Payment",
            "hash":"P2","Account":"rA","Destination":"rB","Amount":"lots"}}"#
        ));
        assert!(store.on_frame(
            r#"{"type":"transaction","transaction":{"TransactionType":"Payment",
            "hash":"P3","Account":"rA","Destination":"rB","Amount":2000000}}"#
        ));

        let snapshot = store.current_snapshot();
        assert_eq!(snapshot.metrics.payment_count, 2);
        assert_eq!(snapshot.metrics.currency_histogram.get("XRP"), Some(&2));
        assert_eq!(snapshot.metrics.total_native_volume, 2.0);
        assert_eq!(
            snapshot.payments[1].amount,
            Some(crate::model::CurrencyAmount::native_text("lots"))
        );
    }

    #[test]
    fn test_ack_is_consumed_without_event() {
        let mut store = store();
        assert!(!store.on_frame(r#"{"status":"success","type":"response","result":{}}"#));
        assert_eq!(store.metrics().total_transactions(), 0);
    }

    #[test]
    fn test_each_mutation_publishes() {
        let mut store = store();
        let versions = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&versions);
        let _sub = store.subscribe(move |snapshot| seen.lock().push(snapshot.version));

        store.on_connection_state(ConnectionStatus::connected());
        store.on_event(TransactionEvent::new(TransactionKind::OfferCreate));
        store.on_tick(Utc::now());

        assert_eq!(*versions.lock(), vec![1, 2, 3]);
        let snapshot = store.current_snapshot();
        assert_eq!(snapshot.version, 3);
        assert_eq!(snapshot.connection.state, ConnectionState::Connected);
        assert_eq!(snapshot.offers.len(), 1);
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let mut store = store();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&calls);
        let _a = store.subscribe(move |_| first.lock().push("first"));
        let second = Arc::clone(&calls);
        let _b = store.subscribe(move |_| second.lock().push("second"));

        store.on_tick(Utc::now());
        assert_eq!(*calls.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = store();
        let count = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&count);
        let subscription = store.subscribe(move |_| *counter.lock() += 1);
        store.on_tick(Utc::now());
        subscription.unsubscribe();
        store.on_tick(Utc::now());

        assert_eq!(*count.lock(), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_publishing() {
        let mut store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let _bad = store.subscribe(|_| panic!("listener failure"));
        let observed = Arc::clone(&seen);
        let _good = store.subscribe(move |snapshot| observed.lock().push(snapshot.version));

        store.on_tick(Utc::now());
        store.on_connection_state(ConnectionStatus::connected());
        store.on_frame(PAYMENT);

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        assert_eq!(store.listener_count(), 1);
        assert_eq!(store.current_snapshot().metrics.payment_count, 1);
    }

    #[test]
    fn test_listener_can_read_store_handle_during_notify() {
        let mut store = store();
        let handle = store.handle();
        let seen = Arc::new(Mutex::new(0u64));

        let observed = Arc::clone(&seen);
        let reader = handle.clone();
        let _sub = handle.subscribe(move |snapshot| {
            // Already published to the watch channel when listeners run.
            assert_eq!(reader.current_snapshot().version, snapshot.version);
            *observed.lock() = snapshot.version;
        });

        store.on_tick(Utc::now());
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_snapshots_are_isolated_from_later_mutations() {
        let mut store = store();
        store.on_frame(PAYMENT);
        let before = store.current_snapshot();

        store.on_frame(PAYMENT);
        assert_eq!(before.metrics.payment_count, 1);
        assert_eq!(before.payments.len(), 1);
        assert_eq!(store.current_snapshot().metrics.payment_count, 2);
    }

    #[test]
    fn test_tick_updates_throughput() {
        let mut store = store();
        store.on_frame(PAYMENT);

        // The payment is dated at ledger time 780000000.
        store.on_tick(ledger_time_to_utc(780_000_030).unwrap());
        let snapshot = store.current_snapshot();
        assert_eq!(snapshot.transactions_per_minute(), 1);
        assert_eq!(snapshot.transactions_per_second(), 1.0 / 60.0);
        assert_eq!(snapshot.unique_account_count(), 2);

        store.on_tick(ledger_time_to_utc(780_000_600).unwrap());
        let snapshot = store.current_snapshot();
        assert_eq!(snapshot.transactions_per_minute(), 0);
        assert_eq!(snapshot.metrics.peak_throughput, 1.0 / 60.0);
    }

    #[tokio::test]
    async fn test_handle_observes_changes() {
        let mut store = store();
        let mut handle = store.handle();

        store.on_connection_state(ConnectionStatus::connected());
        let snapshot = handle.changed().await.unwrap();
        assert_eq!(snapshot.connection.state, ConnectionState::Connected);

        drop(store);
        assert!(handle.changed().await.is_err());
    }
}
