use std::sync::Arc;
use std::time::Duration;

use ledger_flow::format::{format_amount, truncate_address};
use ledger_flow::{ConnectionState, DashboardClient, DashboardSnapshot, FeedConfig};
use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ledger_flow=info")),
        )
        .init();

    // LEDGER_WS_URL, LEDGER_TICK_INTERVAL_SECS, ... override the defaults
    let config = FeedConfig::from_env();
    info!("Connecting to {}", config.endpoint);
    let client = DashboardClient::start(config)?;

    // Log connection changes and every newly flagged large payment.
    let last_state = Arc::new(Mutex::new(None::<ConnectionState>));
    let last_alert = Arc::new(Mutex::new(0u64));
    let _alerts = client.subscribe(move |snapshot: &Arc<DashboardSnapshot>| {
        let mut state = last_state.lock();
        if *state != Some(snapshot.connection.state) {
            info!("Connection: {}", snapshot.connection);
            *state = Some(snapshot.connection.state);
        }

        let mut seen = last_alert.lock();
        if snapshot.metrics.large_payment_count > *seen {
            *seen = snapshot.metrics.large_payment_count;
            if let Some(alert) = &snapshot.metrics.latest_large_payment {
                warn!(
                    "Large payment: {:.2} XRP from {} to {} ({})",
                    alert.amount,
                    truncate_address(alert.account.as_deref().unwrap_or_default()),
                    truncate_address(alert.destination.as_deref().unwrap_or_default()),
                    alert.hash.as_deref().unwrap_or("no hash"),
                );
            }
        }
    });

    let mut summary = tokio::time::interval(Duration::from_secs(10));
    summary.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            _ = summary.tick() => {
                let snapshot = client.snapshot();
                info!("{}", snapshot.metrics);
                info!(
                    "{} tx/min, payments {:.1}%, offers {:.1}%, avg payment {:.2} XRP",
                    snapshot.transactions_per_minute(),
                    snapshot.payment_share(),
                    snapshot.offer_share(),
                    snapshot.average_payment_volume(),
                );
                let top: Vec<String> = snapshot
                    .top_currencies(5)
                    .into_iter()
                    .map(|(currency, count)| format!("{}={}", currency, count))
                    .collect();
                info!("Top currencies: {}", top.join(", "));
                if let Some(latest) = snapshot.payments.first() {
                    if let Some(amount) = &latest.amount {
                        info!("Latest payment: {}", format_amount(amount));
                    }
                }
            }
        }
    }

    client.shutdown().await;
    Ok(())
}
