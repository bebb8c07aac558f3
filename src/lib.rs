pub mod classifier;
pub mod client;
pub mod config;
mod error;
pub mod format;
pub mod history;
pub mod metrics;
pub mod model;
pub mod network;
pub mod store;

pub use classifier::{Classification, ClassifierStats, EventClassifier, RejectReason};
pub use client::DashboardClient;
pub use config::FeedConfig;
pub use error::{LedgerFlowError, Result};
pub use history::{HistoryBuffer, HistoryCategory};
pub use metrics::{AggregateMetrics, MetricsAggregator};
pub use model::{CurrencyAmount, TransactionEvent, TransactionKind};
pub use network::{ConnectionManager, ConnectionState, ConnectionStatus, FeedEvent};
pub use store::{DashboardSnapshot, DashboardStore, StoreHandle, Subscription};
