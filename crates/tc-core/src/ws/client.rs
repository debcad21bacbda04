//! Single WebSocket connection with auto-reconnect and ping keep-alive.
//!
//! Each `WsConnection` runs as a tokio task that:
//! 1. Connects to the WebSocket endpoint (TLS).
//! 2. Sends the subscription message.
//! 3. Parses text frames and pushes the items into an mpsc channel, waiting
//!    for capacity so nothing is dropped.
//! 4. Sends periodic ping messages.
//! 5. Reconnects on disconnection with exponential backoff, optionally giving
//!    up after a number of consecutive failures.
//!
//! The task ends (dropping its channel sender and running its exit hook) on
//! shutdown, when the receiver is gone, or when the reconnect budget is
//! exhausted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Turns one text frame into zero or more items.
pub type FrameParser<T> = Arc<dyn Fn(&str) -> Vec<T> + Send + Sync>;

/// Ping payload format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingPayload {
    /// Send a text frame (e.g. `"ping"` or `{"op":"ping"}`).
    Text(String),
    /// Use the standard WebSocket ping frame.
    WebSocketPing,
}

impl PingPayload {
    /// Text ping when a message is configured, protocol ping otherwise.
    pub fn from_message(message: Option<&str>) -> Self {
        match message {
            Some(m) => Self::Text(m.to_string()),
            None => Self::WebSocketPing,
        }
    }

    fn to_message(&self) -> Message {
        match self {
            Self::Text(t) => Message::Text(t.clone().into()),
            Self::WebSocketPing => Message::Ping(Vec::new().into()),
        }
    }
}

/// Configuration for a single WebSocket connection.
#[derive(Debug, Clone)]
pub struct WsConnConfig {
    /// Full WebSocket URL (e.g. `wss://gateway.local/binance`).
    pub url: String,
    /// Message to send immediately after connection (subscription request).
    pub subscribe_msg: Option<String>,
    /// Extra HTTP headers for the handshake.
    pub extra_headers: HashMap<String, String>,
    /// Interval between ping messages.
    pub ping_interval: Option<Duration>,
    /// Ping message format.
    pub ping_payload: Option<PingPayload>,
    /// Consecutive failed connects tolerated before giving up (`None` = forever).
    pub max_reconnects: Option<u32>,
    /// Connection label used in logs.
    pub label: String,
}

/// A single WebSocket connection managed by a background tokio task.
pub struct WsConnection {
    /// Connection configuration.
    pub config: WsConnConfig,
    /// Shutdown signal sender.
    shutdown_tx: Option<watch::Sender<bool>>,
    /// Task join handle.
    task: Option<tokio::task::JoinHandle<()>>,
}

impl WsConnection {
    /// Create a new (not yet started) connection.
    pub fn new(config: WsConnConfig) -> Self {
        Self { config, shutdown_tx: None, task: None }
    }

    /// Start the connection task. Parsed items are sent to `sink`; `on_exit`
    /// runs once the task has ended for good.
    pub fn start<T, F>(&mut self, parser: FrameParser<T>, sink: mpsc::Sender<T>, on_exit: F)
    where
        T: Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            connection_loop(config, parser, sink, shutdown_rx).await;
            on_exit();
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(task);
    }

    /// Stop the connection and wait for the task to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Main connection loop: connect, subscribe, read, ping, reconnect.
async fn connection_loop<T: Send + 'static>(
    config: WsConnConfig,
    parser: FrameParser<T>,
    sink: mpsc::Sender<T>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut backoff = Duration::from_millis(100);
    let max_backoff = Duration::from_secs(30);
    let label = config.label.as_str();
    let mut failures: u32 = 0;

    loop {
        if *shutdown_rx.borrow() {
            info!("[{label}] shutdown requested");
            return;
        }
        if let Some(limit) = config.max_reconnects
            && failures > limit
        {
            error!("[{label}] giving up after {failures} consecutive failures");
            return;
        }

        info!("[{label}] connecting to {}", config.url);

        let ws_stream = match connect_ws(&config).await {
            Ok(s) => {
                backoff = Duration::from_millis(100);
                failures = 0;
                info!("[{label}] connected");
                s
            }
            Err(e) => {
                failures += 1;
                error!("[{label}] connection failed: {e}, retrying in {backoff:?}");
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {},
                    _ = shutdown_rx.changed() => return,
                }
                backoff = (backoff * 2).min(max_backoff);
                continue;
            }
        };

        let (mut ws_write, mut ws_read) = ws_stream.split();

        if let Some(ref sub_msg) = config.subscribe_msg {
            debug!("[{label}] subscribing: {sub_msg}");
            if let Err(e) = ws_write.send(Message::Text(sub_msg.clone().into())).await {
                error!("[{label}] subscribe send failed: {e}, retrying in {backoff:?}");
                failures += 1;
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {},
                    _ = shutdown_rx.changed() => return,
                }
                backoff = (backoff * 2).min(max_backoff);
                continue;
            }
        }

        let mut ping_interval =
            config.ping_interval.map(|d| tokio::time::interval_at(tokio::time::Instant::now() + d, d));

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("[{label}] shutdown signal received");
                    let _ = ws_write.close().await;
                    return;
                }

                msg = ws_read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            for item in parser(text.as_str()) {
                                if sink.send(item).await.is_err() {
                                    info!("[{label}] receiver dropped, closing");
                                    let _ = ws_write.close().await;
                                    return;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = ws_write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            warn!("[{label}] received close frame");
                            break;
                        }
                        Some(Err(e)) => {
                            error!("[{label}] read error: {e}");
                            break;
                        }
                        None => {
                            warn!("[{label}] stream ended");
                            break;
                        }
                        _ => {} // Binary, Pong, Frame
                    }
                }

                _ = next_ping(&mut ping_interval) => {
                    let ping_msg = config.ping_payload.as_ref().unwrap_or(&PingPayload::WebSocketPing).to_message();
                    if let Err(e) = ws_write.send(ping_msg).await {
                        error!("[{label}] ping send error: {e}");
                        break;
                    }
                }
            }
        }

        failures += 1;
        warn!("[{label}] disconnected, reconnecting in {backoff:?}");
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {},
            _ = shutdown_rx.changed() => return,
        }
        backoff = (backoff * 2).min(max_backoff);
    }
}

/// Resolves on the next ping tick, or never when pinging is disabled.
async fn next_ping(interval: &mut Option<tokio::time::Interval>) {
    match interval {
        Some(i) => {
            i.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Establish a TLS WebSocket connection.
async fn connect_ws(
    config: &WsConnConfig,
) -> anyhow::Result<tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>> {
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    let mut request = config.url.as_str().into_client_request()?;
    for (key, value) in &config.extra_headers {
        request.headers_mut().insert(
            tokio_tungstenite::tungstenite::http::HeaderName::from_bytes(key.as_bytes())?,
            value.parse()?,
        );
    }

    let (stream, _response) = tokio_tungstenite::connect_async(request).await?;
    Ok(stream)
}

/// Validate a WebSocket URL before a connection is started.
pub fn validate_ws_url(url: &str) -> Result<(), crate::error::CollectorError> {
    let parsed = url::Url::parse(url).map_err(|e| crate::error::CollectorError::WebSocket(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(crate::error::CollectorError::WebSocket(format!("{url}: unsupported scheme '{other}'"))),
    }
}
