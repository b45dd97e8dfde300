//! WebSocket client: one session per `open` call

use super::types::{WsConfig, WsError, WsMessage, WsSession};
use super::Connector;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// WebSocket client that opens a single session per request.
///
/// Reconnection is left to the caller: a session ends with exactly one
/// `Disconnected` event and is never re-established internally.
#[derive(Debug, Clone)]
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Spawn a session task and return its channels.
    ///
    /// The task connects, emits `Connected`, forwards frames, and finishes
    /// with a single `Disconnected`. Connection failures are reported through
    /// that final event rather than returned.
    pub fn open_session(&self) -> WsSession {
        let (event_tx, event_rx) = mpsc::channel(self.config.buffer_size);
        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let config = self.config.clone();

        tokio::spawn(async move {
            Self::run_session(config, event_tx, outbound_rx).await;
        });

        WsSession {
            events: event_rx,
            outbound: outbound_tx,
        }
    }

    async fn run_session(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        mut outbound_rx: mpsc::Receiver<String>,
    ) {
        let error = match Self::connect_and_stream(&config, &tx, &mut outbound_rx).await {
            Ok(()) => {
                tracing::info!(url = %config.url, "WebSocket connection closed cleanly");
                None
            }
            Err(e) => {
                tracing::warn!(url = %config.url, error = %e, "WebSocket connection error");
                Some(e.to_string())
            }
        };

        let _ = tx.send(WsMessage::Disconnected { error }).await;
    }

    /// Connect to WebSocket and stream messages
    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
        outbound_rx: &mut mpsc::Receiver<String>,
    ) -> Result<(), WsError> {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let ws_stream = tokio::select! {
            res = connect_async(config.url.as_str()) => {
                let (ws_stream, _response) =
                    res.map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
                ws_stream
            }
            _ = tx.closed() => {
                tracing::debug!("Session abandoned while connecting");
                return Ok(());
            }
        };

        let (mut write, mut read) = ws_stream.split();

        tracing::info!("WebSocket connected");

        if tx.send(WsMessage::Connected).await.is_err() {
            return Ok(());
        }

        let mut ping_interval =
            interval_at(Instant::now() + config.ping_interval, config.ping_interval);
        ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut waiting_for_pong = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            if tx.send(WsMessage::Binary(data)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            waiting_for_pong = false;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Received close frame");
                            return Ok(());
                        }
                        Some(Ok(Message::Frame(_))) => {}
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => return Err(WsError::StreamEnded),
                    }
                }

                msg = outbound_rx.recv() => {
                    match msg {
                        Some(text) => {
                            write.send(Message::Text(text)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        None => {
                            // Owner dropped the session
                            let _ = write.send(Message::Close(None)).await;
                            return Ok(());
                        }
                    }
                }

                _ = ping_interval.tick() => {
                    if waiting_for_pong {
                        return Err(WsError::ConnectionFailed("Pong timeout".into()));
                    }
                    write.send(Message::Ping(vec![])).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    waiting_for_pong = true;
                }
            }
        }
    }
}

#[async_trait]
impl Connector for WsClient {
    async fn open(&self) -> WsSession {
        self.open_session()
    }
}
