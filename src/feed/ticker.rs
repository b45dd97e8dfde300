//! Ticker feed state machine
//!
//! `TickerFeed` holds no sockets or timers. The runtime delivers every
//! socket event, timer expiry and caller command as a [`FeedEvent`] and
//! executes the [`FeedAction`]s that come back.

use super::backoff::ReconnectPolicy;
use super::history::{PriceHistory, DEFAULT_HISTORY_CAPACITY};
use super::message::{decode_frame, price_sample, subscribe_request, ticker_topic, Frame};
use super::types::{
    ConnectionId, ConnectionState, FeedAction, FeedEvent, FeedStats, FeedView, RetryId,
    TickerSnapshot,
};
use crate::telemetry::{increment_counter, CounterMetric};

/// Settings for a single-symbol feed
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Trading symbol, e.g. "BTCUSDT"
    pub symbol: String,
    /// Automatic reconnect policy
    pub policy: ReconnectPolicy,
    /// Rolling history length
    pub history_capacity: usize,
}

impl FeedSettings {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            policy: ReconnectPolicy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    pub fn policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn history_capacity(mut self, n: usize) -> Self {
        self.history_capacity = n;
        self
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self::new("BTCUSDT")
    }
}

/// Live subscription to one symbol's ticker
#[derive(Debug)]
pub struct TickerFeed {
    topic: String,
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempts: u32,
    active: Option<ConnectionId>,
    pending_retry: Option<RetryId>,
    next_token: u64,
    snapshot: Option<TickerSnapshot>,
    history: PriceHistory,
    stats: FeedStats,
}

impl TickerFeed {
    pub fn new(settings: FeedSettings) -> Self {
        Self {
            topic: ticker_topic(&settings.symbol),
            policy: settings.policy,
            state: ConnectionState::Disconnected,
            attempts: 0,
            active: None,
            pending_retry: None,
            next_token: 0,
            snapshot: None,
            history: PriceHistory::new(settings.history_capacity),
            stats: FeedStats::default(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Automatic retries made since the last successful open or manual reconnect
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn snapshot(&self) -> Option<&TickerSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    pub fn pending_retry(&self) -> Option<RetryId> {
        self.pending_retry
    }

    pub fn active_connection(&self) -> Option<ConnectionId> {
        self.active
    }

    /// Out of automatic retries; only a manual reconnect leaves this state
    pub fn is_exhausted(&self) -> bool {
        self.state == ConnectionState::Disconnected
            && self.pending_retry.is_none()
            && !self.policy.can_retry(self.attempts)
    }

    pub fn view(&self) -> FeedView {
        FeedView {
            snapshot: self.snapshot.clone(),
            state: self.state,
            is_connected: self.is_connected(),
            history: self.history.clone(),
            attempts: self.attempts,
            stats: self.stats,
        }
    }

    /// Apply one event and return the side effects it requires
    pub fn handle_event(&mut self, event: FeedEvent) -> Vec<FeedAction> {
        let mut actions = Vec::new();

        match event {
            FeedEvent::Start => {
                if self.active.is_some() {
                    tracing::debug!(state = ?self.state, "Start ignored, connection already active");
                } else {
                    self.cancel_retry(&mut actions);
                    self.begin_connect(&mut actions);
                }
            }
            FeedEvent::Opened { conn } => {
                if self.is_current(conn) {
                    self.on_opened(conn, &mut actions);
                }
            }
            FeedEvent::Frame { conn, text } => {
                if self.is_current(conn) {
                    self.on_frame(&text);
                }
            }
            FeedEvent::Closed { conn, error } => {
                if self.is_current(conn) {
                    self.on_closed(error, &mut actions);
                } else {
                    tracing::trace!(conn = conn.0, "Ignoring close of superseded connection");
                }
            }
            FeedEvent::RetryElapsed { retry } => {
                if self.pending_retry == Some(retry) {
                    self.pending_retry = None;
                    self.attempts += 1;
                    tracing::info!(
                        attempt = self.attempts,
                        max = self.policy.max_attempts,
                        "Reconnecting"
                    );
                    self.begin_connect(&mut actions);
                } else {
                    tracing::trace!(retry = retry.0, "Ignoring stale retry timer");
                }
            }
            FeedEvent::Reconnect => {
                tracing::info!("Manual reconnect requested");
                self.close_active(&mut actions);
                self.cancel_retry(&mut actions);
                self.attempts = 0;
                self.begin_connect(&mut actions);
            }
            FeedEvent::Shutdown => {
                tracing::info!("Shutting down ticker feed");
                self.cancel_retry(&mut actions);
                self.close_active(&mut actions);
            }
        }

        actions
    }

    fn is_current(&self, conn: ConnectionId) -> bool {
        self.active == Some(conn)
    }

    fn next_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn begin_connect(&mut self, actions: &mut Vec<FeedAction>) {
        let conn = ConnectionId(self.next_token());
        self.active = Some(conn);
        self.state = ConnectionState::Connecting;
        tracing::info!(conn = conn.0, topic = %self.topic, "Connecting ticker feed");
        actions.push(FeedAction::Connect { conn });
    }

    fn close_active(&mut self, actions: &mut Vec<FeedAction>) {
        if let Some(conn) = self.active.take() {
            actions.push(FeedAction::Close { conn });
        }
        self.state = ConnectionState::Disconnected;
    }

    fn cancel_retry(&mut self, actions: &mut Vec<FeedAction>) {
        if let Some(retry) = self.pending_retry.take() {
            actions.push(FeedAction::CancelRetry { retry });
        }
    }

    fn on_opened(&mut self, conn: ConnectionId, actions: &mut Vec<FeedAction>) {
        self.state = ConnectionState::Connected;
        self.attempts = 0;
        self.stats.connections_opened += 1;
        increment_counter(CounterMetric::ConnectionsOpened);

        actions.push(FeedAction::Send {
            conn,
            text: subscribe_request(&self.topic),
        });
        tracing::info!(conn = conn.0, topic = %self.topic, "Connected, subscribed to ticker");
    }

    fn on_frame(&mut self, text: &str) {
        self.stats.frames_received += 1;

        match decode_frame(text, &self.topic) {
            Ok(Frame::Ticker(snapshot)) => {
                self.stats.frames_accepted += 1;
                increment_counter(CounterMetric::FramesAccepted);

                match price_sample(&snapshot.last_price) {
                    Some(price) => self.history.push(price),
                    None => tracing::debug!(
                        last_price = %snapshot.last_price,
                        "Last price not numeric, history unchanged"
                    ),
                }
                tracing::debug!(
                    last_price = %snapshot.last_price,
                    ts = snapshot.timestamp,
                    "Ticker update"
                );
                self.snapshot = Some(snapshot);
            }
            Ok(Frame::Control(ctrl)) => {
                if ctrl.success == Some(false) {
                    tracing::warn!(
                        op = %ctrl.op,
                        ret_msg = ?ctrl.ret_msg,
                        "Stream operation rejected"
                    );
                } else {
                    tracing::debug!(op = %ctrl.op, "Stream operation acknowledged");
                }
            }
            Err(e) => {
                self.stats.frames_rejected += 1;
                increment_counter(CounterMetric::FramesRejected);
                tracing::warn!(
                    error = %e,
                    msg_preview = %text.chars().take(100).collect::<String>(),
                    "Dropping ticker frame"
                );
            }
        }
    }

    fn on_closed(&mut self, error: Option<String>, actions: &mut Vec<FeedAction>) {
        match &error {
            Some(e) => tracing::warn!(error = %e, "Ticker feed disconnected"),
            None => tracing::info!("Ticker feed disconnected"),
        }
        self.active = None;
        self.state = ConnectionState::Disconnected;

        if self.policy.can_retry(self.attempts) {
            let delay = self.policy.delay(self.attempts);
            let retry = RetryId(self.next_token());
            self.pending_retry = Some(retry);
            tracing::info!(
                delay_ms = delay.as_millis() as u64,
                attempt = self.attempts + 1,
                max = self.policy.max_attempts,
                "Scheduling reconnect"
            );
            actions.push(FeedAction::ScheduleRetry { retry, delay });
        } else {
            increment_counter(CounterMetric::RetriesExhausted);
            tracing::error!(
                attempts = self.attempts,
                "Max reconnection attempts reached, waiting for manual reconnect"
            );
        }
    }
}
