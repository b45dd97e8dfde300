//! Watch command implementation

use crate::config::Config;
use crate::feed::{ConnectionState, FeedService, FeedView, TickerSnapshot};
use crate::ws::WsClient;
use clap::Args;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Stop after this many ticker updates
    #[arg(short = 'n', long)]
    pub max_updates: Option<u64>,

    /// Print each snapshot as a JSON line on stdout
    #[arg(long)]
    pub json: bool,
}

impl WatchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let settings = config.feed.settings();
        let max_attempts = settings.policy.max_attempts;
        let client = WsClient::new(config.feed.ws_config());
        let handle = FeedService::new(settings, client).spawn();
        let mut changes = handle.changes();

        tracing::info!(
            url = %config.feed.url,
            symbol = %config.feed.symbol,
            "Watching ticker (press Enter to reconnect)"
        );

        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let mut last = FeedView::default();
        let mut updates = 0u64;

        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        tracing::warn!("Feed stopped unexpectedly");
                        break;
                    }
                    let view = changes.borrow_and_update().clone();

                    if view.state != last.state {
                        self.report_state(&view, max_attempts);
                    }
                    let fresh = accepted_since(&last, &view);
                    if fresh > 0 {
                        if let Some(snapshot) = &view.snapshot {
                            self.report_snapshot(snapshot, &view)?;
                        }
                        updates += fresh;
                    }
                    last = view;

                    if self.max_updates.is_some_and(|n| updates >= n) {
                        break;
                    }
                }

                line = async {
                    if stdin_open {
                        stdin.next_line().await
                    } else {
                        std::future::pending().await
                    }
                } => {
                    match line {
                        Ok(Some(_)) => handle.reconnect().await?,
                        Ok(None) | Err(_) => stdin_open = false,
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received shutdown signal");
                    break;
                }
            }
        }

        handle.shutdown().await?;
        Ok(())
    }

    fn report_state(&self, view: &FeedView, max_attempts: u32) {
        match view.state {
            ConnectionState::Connected => tracing::info!("Connected"),
            ConnectionState::Connecting => {
                tracing::info!(attempt = view.attempts, "Connecting")
            }
            ConnectionState::Disconnected if view.attempts >= max_attempts => {
                tracing::error!("Disconnected, retries exhausted. Press Enter to reconnect")
            }
            ConnectionState::Disconnected => tracing::warn!("Disconnected"),
        }
    }

    fn report_snapshot(&self, snapshot: &TickerSnapshot, view: &FeedView) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(snapshot)?);
            return Ok(());
        }

        let change_pct = snapshot
            .change_pct_decimal()
            .map(|p| (p * Decimal::ONE_HUNDRED).round_dp(2));
        let range = view
            .history
            .range()
            .filter(|_| view.history.has_trend())
            .map(|(lo, hi)| format!("{:.2}..{:.2}", lo, hi));

        tracing::info!(
            price = %snapshot.last_price,
            high = %snapshot.high_price_24h,
            low = %snapshot.low_price_24h,
            change_pct = ?change_pct,
            up = snapshot.is_positive(),
            volume = %snapshot.volume_24h,
            turnover = %snapshot.turnover_24h,
            server_time = ?snapshot.server_time().map(|t| t.to_rfc3339()),
            window = ?range,
            "Ticker"
        );
        Ok(())
    }
}

/// Ticker frames accepted between two views.
///
/// The watch channel coalesces changes, so one notification can cover
/// several frames.
fn accepted_since(last: &FeedView, view: &FeedView) -> u64 {
    view.stats
        .frames_accepted
        .saturating_sub(last.stats.frames_accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedStats;

    fn view_with_accepted(frames_accepted: u64) -> FeedView {
        FeedView {
            stats: FeedStats {
                frames_accepted,
                ..FeedStats::default()
            },
            ..FeedView::default()
        }
    }

    #[test]
    fn test_accepted_since_counts_coalesced_frames() {
        let last = view_with_accepted(2);
        let view = view_with_accepted(5);
        assert_eq!(accepted_since(&last, &view), 3);
    }

    #[test]
    fn test_accepted_since_ignores_state_only_changes() {
        let last = view_with_accepted(4);
        assert_eq!(accepted_since(&last, &view_with_accepted(4)), 0);
        assert_eq!(accepted_since(&last, &FeedView::default()), 0);
    }
}
