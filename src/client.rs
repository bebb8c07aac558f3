use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::FeedConfig;
use crate::error::Result;
use crate::network::{ConnectionManager, ConnectionState, ConnectionStatus, FeedEvent};
use crate::store::{DashboardSnapshot, DashboardStore, StoreHandle, Subscription};

/// Status message used when the feed goes quiet.
pub const IDLE_MESSAGE: &str = "No recent transactions received";

/// A running dashboard session.
///
/// Owns the [`ConnectionManager`] and a driver task that owns the
/// [`DashboardStore`]. The driver applies feed events in arrival order and
/// ticks the metrics on a fixed period; consumers read through a
/// [`StoreHandle`].
pub struct DashboardClient {
    connection: ConnectionManager,
    store: StoreHandle,
    shutdown: CancellationToken,
    driver: Option<JoinHandle<()>>,
}

impl DashboardClient {
    /// Connect to the configured feed and start aggregating.
    pub fn start(config: FeedConfig) -> Result<Self> {
        config.validate()?;

        // Both ring and aws-lc may be compiled in; pick one explicitly.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let (tx_feed_event, rx_feed_event) = mpsc::channel(config.event_channel_capacity);
        let mut connection =
            ConnectionManager::new(&config.endpoint, config.reconnect_delay, tx_feed_event)?;

        let store = DashboardStore::new(&config);
        let handle = store.handle();
        let shutdown = CancellationToken::new();

        let driver = Driver {
            store,
            events: rx_feed_event,
            config,
            shutdown: shutdown.clone(),
        };
        let driver = tokio::spawn(driver.run());
        connection.start();

        Ok(Self {
            connection,
            store: handle,
            shutdown,
            driver: Some(driver),
        })
    }

    /// Read access to the published state.
    pub fn store(&self) -> StoreHandle {
        self.store.clone()
    }

    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.store.current_snapshot()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<DashboardSnapshot>) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Stop the connection (cancelling any pending reconnect), then the
    /// driver. No listener is called after this returns.
    pub async fn shutdown(mut self) {
        self.connection.stop().await;
        self.shutdown.cancel();
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                if e.is_panic() {
                    error!("Dashboard driver panicked: {}", e);
                }
            }
        }
        info!("Dashboard session closed");
    }
}

impl Drop for DashboardClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

/// Single owner of the store.
struct Driver {
    store: DashboardStore,
    events: mpsc::Receiver<FeedEvent>,
    config: FeedConfig,
    shutdown: CancellationToken,
}

impl Driver {
    async fn run(mut self) {
        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The tick is polled ahead of the feed so a backlog cannot starve it.
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => self.handle_tick(),
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
        }
    }

    fn handle_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Status(status) => self.store.on_connection_state(status),
            FeedEvent::Frame(raw) => {
                let applied = self.store.on_frame(&raw);
                if applied && self.store.connection().state == ConnectionState::Idle {
                    self.store.on_connection_state(ConnectionStatus::connected());
                }
            }
        }
    }

    fn handle_tick(&mut self) {
        self.store.on_tick(Utc::now());

        if self.config.idle_demotion
            && self.store.connection().state == ConnectionState::Connected
            && self.store.metrics().recent_window_count == 0
        {
            info!("Feed idle: {}", IDLE_MESSAGE);
            self.store
                .on_connection_state(ConnectionStatus::with_message(ConnectionState::Idle, IDLE_MESSAGE));
        }
    }
}
