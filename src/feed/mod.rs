//! Ticker feed module
//!
//! Live 24h ticker for one symbol from the Bybit v5 public stream, with a
//! rolling price window and bounded exponential reconnect.

mod backoff;
mod history;
mod message;
mod service;
mod ticker;
mod types;

pub use backoff::ReconnectPolicy;
pub use history::{PriceHistory, DEFAULT_HISTORY_CAPACITY};
pub use message::{
    decode_frame, price_sample, subscribe_request, ticker_topic, ControlFrame, Frame, FrameError,
};
pub use service::{FeedError, FeedHandle, FeedService};
pub use ticker::{FeedSettings, TickerFeed};
pub use types::{
    ConnectionId, ConnectionState, FeedAction, FeedEvent, FeedStats, FeedView, RetryId,
    TickerSnapshot,
};

/// Bybit v5 public linear stream
pub const BYBIT_LINEAR_WS_URL: &str = "wss://stream.bybit.com/v5/public/linear";
