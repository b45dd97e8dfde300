//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// WebSocket session configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Interval for sending ping frames
    pub ping_interval: Duration,
    /// Inbound channel capacity
    pub buffer_size: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            ping_interval: Duration::from_secs(20),
            buffer_size: 1024,
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Set inbound channel capacity
    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n;
        self
    }
}

/// WebSocket message types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// Text message
    Text(String),
    /// Binary message
    Binary(Vec<u8>),
    /// Connection established
    Connected,
    /// Connection closed; `error` is set unless the close was clean
    Disconnected { error: Option<String> },
}

/// One live (or pending) WebSocket connection.
///
/// Inbound events arrive on `events`. Text queued on `outbound` is written to
/// the socket; dropping `outbound` closes the connection.
#[derive(Debug)]
pub struct WsSession {
    pub events: mpsc::Receiver<WsMessage>,
    pub outbound: mpsc::Sender<String>,
}

/// WebSocket errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WsError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Send failed
    #[error("Send failed: {0}")]
    SendFailed(String),
    /// Stream ended without a close frame
    #[error("Stream ended unexpectedly")]
    StreamEnded,
}
