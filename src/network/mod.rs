pub mod connection;
pub mod state;

pub use connection::{ConnectionManager, FeedEvent, DEFAULT_RECONNECT_DELAY};
pub use state::{ConnectionState, ConnectionStatus};
