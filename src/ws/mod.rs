//! WebSocket transport
//!
//! Single-session WebSocket client with ping/pong handling. Reconnection
//! policy lives with the caller.

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsConfig, WsError, WsMessage, WsSession};

use async_trait::async_trait;

/// Something that can open a WebSocket session
#[async_trait]
pub trait Connector: Send + Sync {
    /// Begin a new session. Failures surface as a `Disconnected` event.
    async fn open(&self) -> WsSession;
}
