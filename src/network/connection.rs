use crate::error::Result;
use crate::model::SubscribeCommand;
use crate::network::state::{ConnectionState, ConnectionStatus};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Delay before reconnecting after a close or error.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// What the connection task hands to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Status(ConnectionStatus),
    /// A raw inbound text frame.
    Frame(String),
}

/// Owns one upstream feed connection and keeps it alive.
///
/// `start` spawns a task that connects, subscribes to the transaction
/// stream and forwards every text frame. Whenever the socket closes or
/// fails, exactly one reconnection is scheduled after the configured delay,
/// forever, until `stop` is called.
pub struct ConnectionManager {
    url: Url,
    subscribe_payload: String,
    reconnect_delay: Duration,
    event_sender: mpsc::Sender<FeedEvent>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(
        url: &str,
        reconnect_delay: Duration,
        event_sender: mpsc::Sender<FeedEvent>,
    ) -> Result<Self> {
        Ok(Self {
            url: Url::parse(url)?,
            subscribe_payload: serde_json::to_string(&SubscribeCommand::transactions())?,
            reconnect_delay,
            event_sender,
            shutdown: CancellationToken::new(),
            task: None,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Spawn the connection task. No-op while it is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("Connection to {} already running", self.url);
            return;
        }

        self.shutdown = CancellationToken::new();
        let worker = Worker {
            url: self.url.clone(),
            subscribe_payload: self.subscribe_payload.clone(),
            reconnect_delay: self.reconnect_delay,
            event_sender: self.event_sender.clone(),
            shutdown: self.shutdown.clone(),
        };
        self.task = Some(tokio::spawn(worker.run()));
    }

    /// Close the connection and cancel any pending reconnect.
    ///
    /// Waits for the connection task to finish, so no event is emitted
    /// once this returns.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Connection task panicked: {}", e);
                }
            }
            info!("Connection to {} stopped", self.url);
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// How a connected session ended.
enum SessionEnd {
    /// Shutdown requested or the consumer went away.
    Stopped,
    /// The socket closed or failed; reconnect after reporting this status.
    Lost(ConnectionStatus),
}

struct Worker {
    url: Url,
    subscribe_payload: String,
    reconnect_delay: Duration,
    event_sender: mpsc::Sender<FeedEvent>,
    shutdown: CancellationToken,
}

impl Worker {
    // Runs until shutdown or until the consumer drops its receiver.
    async fn run(self) {
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            if !self.emit(FeedEvent::Status(ConnectionStatus::connecting())).await {
                return;
            }
            info!("Connecting to {} (attempt {})...", self.url, attempt);

            let connected = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return,
                result = connect_async(self.url.as_str()) => result,
            };

            let status = match connected {
                Ok((ws_stream, _)) => match self.session(ws_stream).await {
                    SessionEnd::Stopped => return,
                    SessionEnd::Lost(status) => status,
                },
                Err(e) => {
                    error!("Connection failed: {}", e);
                    ConnectionStatus::error(e.to_string())
                }
            };

            if !self.emit(FeedEvent::Status(status)).await {
                return;
            }

            info!("Reconnecting in {:?}...", self.reconnect_delay);
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return,
                _ = sleep(self.reconnect_delay) => {}
            }
        }
    }

    async fn session(&self, ws_stream: WsStream) -> SessionEnd {
        info!("Connected to {}", self.url);
        if !self.emit(FeedEvent::Status(ConnectionStatus::connected())).await {
            return SessionEnd::Stopped;
        }

        // 'write' carries the subscribe request, 'read' the feed.
        let (mut write, mut read) = ws_stream.split();

        if let Err(e) = write.send(Message::Text(self.subscribe_payload.clone().into())).await {
            error!("Failed to send subscribe request: {}", e);
            return SessionEnd::Lost(ConnectionStatus::error(format!("subscribe failed: {}", e)));
        }
        debug!("Subscribe request sent");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    // Best effort, the peer may already be gone.
                    let _ = timeout(Duration::from_secs(1), write.send(Message::Close(None))).await;
                    return SessionEnd::Stopped;
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if !self.emit(FeedEvent::Frame(text.to_string())).await {
                                return SessionEnd::Stopped;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame
                                .map(|f| f.reason.to_string())
                                .filter(|r| !r.is_empty());
                            warn!("Server closed the connection: {:?}", reason);
                            let status = match reason {
                                Some(reason) => {
                                    ConnectionStatus::with_message(ConnectionState::Disconnected, reason)
                                }
                                None => ConnectionStatus::new(ConnectionState::Disconnected),
                            };
                            return SessionEnd::Lost(status);
                        }
                        Some(Ok(_)) => {
                            // Ping/pong are answered by tungstenite, binary is not part of the feed.
                        }
                        Some(Err(e)) => {
                            error!("WebSocket error: {}", e);
                            return SessionEnd::Lost(ConnectionStatus::error(e.to_string()));
                        }
                        None => {
                            warn!("Stream ended unexpectedly");
                            return SessionEnd::Lost(ConnectionStatus::new(ConnectionState::Disconnected));
                        }
                    }
                }
            }
        }
    }

    /// Send an event unless shutdown wins first. Returns false when the
    /// task should stop.
    async fn emit(&self, event: FeedEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => false,
            sent = self.event_sender.send(event) => {
                if sent.is_err() {
                    info!("Event receiver dropped, shutting down connection");
                }
                sent.is_ok()
            }
        }
    }
}
