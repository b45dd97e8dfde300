//! Integration tests for configuration

use std::time::Duration;
use ticker_feed::config::Config;
use ticker_feed::feed::{TickerFeed, BYBIT_LINEAR_WS_URL};

#[test]
fn test_config_example_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();

    assert_eq!(config.feed.url, BYBIT_LINEAR_WS_URL);
    assert_eq!(config.feed.symbol, "BTCUSDT");

    let policy = config.feed.reconnect_policy();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay(0), Duration::from_millis(1000));
    assert_eq!(policy.delay(10), Duration::from_millis(30_000));
}

#[test]
fn test_settings_drive_topic() {
    let config: Config = toml::from_str("[feed]\nsymbol = \"ethusdt\"\n").unwrap();
    let feed = TickerFeed::new(config.feed.settings());
    assert_eq!(feed.topic(), "tickers.ETHUSDT");
    assert_eq!(feed.history().capacity(), 60);
}
