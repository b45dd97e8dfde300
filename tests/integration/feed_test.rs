//! Integration tests for the ticker feed

use async_trait::async_trait;
use std::time::Duration;
use ticker_feed::feed::{
    ConnectionState, FeedAction, FeedEvent, FeedService, FeedSettings, TickerFeed,
};
use ticker_feed::ws::{Connector, WsMessage, WsSession};
use tokio::sync::mpsc;

fn frame(topic: &str, price: &str, ts: i64) -> String {
    format!(
        r#"{{"topic":"{}","type":"snapshot","data":{{"symbol":"BTCUSDT","lastPrice":"{}","highPrice24h":"70000","lowPrice24h":"60000","turnover24h":"","price24hPcnt":"-0.01","volume24h":"1"}},"ts":{}}}"#,
        topic, price, ts
    )
}

#[test]
fn test_history_matches_recent_parseable_prices() {
    let mut feed = TickerFeed::new(FeedSettings::default());
    let conn = match feed.handle_event(FeedEvent::Start).as_slice() {
        [FeedAction::Connect { conn }] => *conn,
        other => panic!("unexpected actions {:?}", other),
    };
    feed.handle_event(FeedEvent::Opened { conn });

    let mut expected = Vec::new();
    for i in 0..200i64 {
        let text = match i % 7 {
            // off-topic
            0 => frame("tickers.ETHUSDT", "1", i),
            // accepted but unparseable
            3 => frame("tickers.BTCUSDT", "oops", i),
            // garbage
            5 => "{not json".to_string(),
            _ => {
                let price = 60000.0 + i as f64 * 0.25;
                expected.push(price);
                frame("tickers.BTCUSDT", &price.to_string(), i)
            }
        };
        feed.handle_event(FeedEvent::Frame { conn, text });
        assert!(feed.history().len() <= 60);
    }

    let tail: Vec<f64> = expected[expected.len() - 60..].to_vec();
    assert_eq!(feed.history().to_vec(), tail);
    assert_eq!(feed.snapshot().unwrap().timestamp, 199);
    assert!(!feed.snapshot().unwrap().is_positive());
}

struct ChannelConnector {
    sessions: mpsc::UnboundedSender<(mpsc::Sender<WsMessage>, mpsc::Receiver<String>)>,
}

#[async_trait]
impl Connector for ChannelConnector {
    async fn open(&self) -> WsSession {
        let (event_tx, event_rx) = mpsc::channel(16);
        let (outbound_tx, outbound_rx) = mpsc::channel(16);
        let _ = self.sessions.send((event_tx, outbound_rx));
        WsSession {
            events: event_rx,
            outbound: outbound_tx,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_feed_recovers_after_drop() {
    let (tx, mut sessions) = mpsc::unbounded_channel();
    let handle = FeedService::new(FeedSettings::default(), ChannelConnector { sessions: tx }).spawn();
    let mut changes = handle.changes();

    let (events, mut outbound) = sessions.recv().await.unwrap();
    events.send(WsMessage::Connected).await.unwrap();
    outbound.recv().await.unwrap();
    events
        .send(WsMessage::Text(frame("tickers.BTCUSDT", "65000.5", 1)))
        .await
        .unwrap();
    changes.wait_for(|v| v.snapshot.is_some()).await.unwrap();

    // server drops the connection
    events
        .send(WsMessage::Disconnected {
            error: Some("reset by peer".into()),
        })
        .await
        .unwrap();

    let (events, mut outbound) = tokio::time::timeout(Duration::from_secs(2), sessions.recv())
        .await
        .expect("retry within backoff delay")
        .unwrap();
    events.send(WsMessage::Connected).await.unwrap();
    outbound.recv().await.unwrap();

    let view = changes
        .wait_for(|v| v.state == ConnectionState::Connected && v.stats.connections_opened == 2)
        .await
        .unwrap()
        .clone();
    assert_eq!(view.attempts, 0);
    // state accumulated before the drop survives
    assert_eq!(view.history.to_vec(), vec![65000.5]);
    assert_eq!(view.snapshot.unwrap().last_price, "65000.5");

    handle.shutdown().await.unwrap();
}
