//! Feed counters
//!
//! Emitted through the `metrics` facade; they are no-ops until a recorder is
//! installed.

/// Counter metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    /// Ticker frames accepted into the snapshot
    FramesAccepted,
    /// Frames dropped as malformed or off-topic
    FramesRejected,
    /// Successful socket opens
    ConnectionsOpened,
    /// Automatic retry budget used up
    RetriesExhausted,
}

impl CounterMetric {
    pub fn name(self) -> &'static str {
        match self {
            CounterMetric::FramesAccepted => "ticker_feed_frames_accepted_total",
            CounterMetric::FramesRejected => "ticker_feed_frames_rejected_total",
            CounterMetric::ConnectionsOpened => "ticker_feed_connections_opened_total",
            CounterMetric::RetriesExhausted => "ticker_feed_retries_exhausted_total",
        }
    }
}

/// Bump a counter by one
pub fn increment_counter(metric: CounterMetric) {
    metrics::counter!(metric.name()).increment(1);
}
