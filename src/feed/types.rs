//! Ticker feed types

use super::history::PriceHistory;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Latest normalized 24h ticker for the subscribed symbol.
///
/// Numeric fields keep the exchange's decimal strings verbatim. A field the
/// exchange left empty holds `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSnapshot {
    /// Last traded price
    pub last_price: String,
    /// 24h high
    pub high_price_24h: String,
    /// 24h low
    pub low_price_24h: String,
    /// 24h turnover in quote currency
    pub turnover_24h: String,
    /// 24h change as a fraction (e.g. "0.012" = +1.2%)
    pub price_24h_pcnt: String,
    /// 24h volume in base currency
    pub volume_24h: String,
    /// Server timestamp (epoch milliseconds)
    pub timestamp: i64,
}

impl TickerSnapshot {
    pub fn last_price_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.last_price).ok()
    }

    pub fn high_price_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.high_price_24h).ok()
    }

    pub fn low_price_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.low_price_24h).ok()
    }

    pub fn change_pct_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.price_24h_pcnt).ok()
    }

    /// True when the 24h change is zero or positive.
    ///
    /// An unparseable change counts as zero.
    pub fn is_positive(&self) -> bool {
        self.change_pct_decimal()
            .map(|pct| !pct.is_sign_negative() || pct.is_zero())
            .unwrap_or(true)
    }

    /// Server timestamp as a UTC datetime
    pub fn server_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Connectivity of the feed's single socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Identifies one connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// Identifies one scheduled retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryId(pub u64);

/// Inputs to [`TickerFeed::handle_event`](super::TickerFeed::handle_event)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Open a connection if none is active
    Start,
    /// The socket for `conn` is open
    Opened { conn: ConnectionId },
    /// A text frame arrived on `conn`
    Frame { conn: ConnectionId, text: String },
    /// The socket for `conn` closed (or never opened)
    Closed {
        conn: ConnectionId,
        error: Option<String>,
    },
    /// The retry timer `retry` fired
    RetryElapsed { retry: RetryId },
    /// Caller-requested reset
    Reconnect,
    /// Teardown
    Shutdown,
}

/// Side effects requested by the feed, executed by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedAction {
    /// Open a new socket tagged `conn`
    Connect { conn: ConnectionId },
    /// Write a text frame on `conn`
    Send { conn: ConnectionId, text: String },
    /// Close `conn` without treating it as a failure
    Close { conn: ConnectionId },
    /// Fire `RetryElapsed { retry }` after `delay`
    ScheduleRetry { retry: RetryId, delay: Duration },
    /// Drop the pending timer `retry`
    CancelRetry { retry: RetryId },
}

/// Running counters for the feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub frames_received: u64,
    pub frames_accepted: u64,
    pub frames_rejected: u64,
    pub connections_opened: u64,
}

/// Read-only view published to consumers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedView {
    pub snapshot: Option<TickerSnapshot>,
    pub state: ConnectionState,
    pub is_connected: bool,
    pub history: PriceHistory,
    pub attempts: u32,
    pub stats: FeedStats,
}
