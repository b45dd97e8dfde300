//! Configuration types for ticker-feed

use crate::feed::{FeedSettings, ReconnectPolicy, BYBIT_LINEAR_WS_URL, DEFAULT_HISTORY_CAPACITY};
use crate::telemetry::LogFormat;
use crate::ws::WsConfig;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Ticker feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket endpoint
    #[serde(default = "default_url")]
    pub url: String,

    /// Trading symbol, e.g. "BTCUSDT"
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Automatic reconnects before waiting for a manual reconnect
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// First reconnect delay (milliseconds), doubled per attempt
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Reconnect delay ceiling (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Rolling price history length
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Transport ping interval (seconds)
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_url() -> String {
    BYBIT_LINEAR_WS_URL.to_string()
}
fn default_symbol() -> String {
    "BTCUSDT".to_string()
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    30_000
}
fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}
fn default_ping_interval_secs() -> u64 {
    20
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            symbol: default_symbol(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            history_capacity: default_history_capacity(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

impl FeedConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_reconnect_attempts,
            base_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    pub fn settings(&self) -> FeedSettings {
        FeedSettings::new(&self.symbol)
            .policy(self.reconnect_policy())
            .history_capacity(self.history_capacity)
    }

    pub fn ws_config(&self) -> WsConfig {
        WsConfig::new(&self.url).ping_interval(Duration::from_secs(self.ping_interval_secs))
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [feed]
            url = "wss://stream-testnet.bybit.com/v5/public/linear"
            symbol = "ETHUSDT"
            max_reconnect_attempts = 3
            initial_delay_ms = 500
            max_delay_ms = 10000
            history_capacity = 120
            ping_interval_secs = 15

            [telemetry]
            log_level = "debug"
            log_format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.feed.symbol, "ETHUSDT");
        assert_eq!(config.feed.max_reconnect_attempts, 3);
        assert_eq!(config.feed.history_capacity, 120);
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.feed.url, BYBIT_LINEAR_WS_URL);
        assert_eq!(config.feed.symbol, "BTCUSDT");
        assert_eq!(config.feed.max_reconnect_attempts, 5);
        assert_eq!(config.feed.history_capacity, 60);
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_feed_section() {
        let config: Config = toml::from_str("[feed]\nsymbol = \"SOLUSDT\"\n").unwrap();
        assert_eq!(config.feed.symbol, "SOLUSDT");
        assert_eq!(config.feed.initial_delay_ms, 1000);
        assert_eq!(config.feed.max_delay_ms, 30_000);
    }

    #[test]
    fn test_reconnect_policy_from_config() {
        let policy = FeedConfig::default().reconnect_policy();
        assert_eq!(policy, ReconnectPolicy::default());
    }

    #[test]
    fn test_ws_config_from_feed_config() {
        let ws = FeedConfig::default().ws_config();
        assert_eq!(ws.url, BYBIT_LINEAR_WS_URL);
        assert_eq!(ws.ping_interval, Duration::from_secs(20));
    }

    #[test]
    fn test_invalid_log_format() {
        let result: Result<Config, _> = toml::from_str("[telemetry]\nlog_format = \"xml\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[feed]\nsymbol = \"BTCUSDT\"\nmax_reconnect_attempts = 2").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.feed.max_reconnect_attempts, 2);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
