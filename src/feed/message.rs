//! Bybit v5 public stream wire format

use super::types::TickerSnapshot;
use serde::Deserialize;
use thiserror::Error;

/// Topic name for a symbol's ticker channel
pub fn ticker_topic(symbol: &str) -> String {
    format!("tickers.{}", symbol.to_uppercase())
}

/// Subscribe directive for a single topic
pub fn subscribe_request(topic: &str) -> String {
    serde_json::json!({
        "op": "subscribe",
        "args": [topic],
    })
    .to_string()
}

/// Why an inbound frame was dropped
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("frame has neither topic nor op")]
    Unrecognized,

    #[error("unexpected topic {actual:?} (subscribed to {expected:?})")]
    TopicMismatch { expected: String, actual: String },

    #[error("ticker frame without data payload")]
    MissingData,

    #[error("ticker payload missing {0}")]
    IncompleteTicker(&'static str),

    #[error("ticker frame without ts")]
    MissingTimestamp,
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Accepted ticker update, already normalized
    Ticker(TickerSnapshot),
    /// Operation response (subscribe ack, pong)
    Control(ControlFrame),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFrame {
    pub op: String,
    pub success: Option<bool>,
    pub ret_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    topic: Option<String>,
    data: Option<serde_json::Value>,
    ts: Option<i64>,
    op: Option<String>,
    success: Option<bool>,
    ret_msg: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerPayload {
    last_price: Option<serde_json::Value>,
    high_price_24h: Option<serde_json::Value>,
    low_price_24h: Option<serde_json::Value>,
    turnover_24h: Option<serde_json::Value>,
    price_24h_pcnt: Option<serde_json::Value>,
    volume_24h: Option<serde_json::Value>,
}

/// Text form of a payload field; `None` for null, `false`, `0` and `""`
fn field_text(field: Option<serde_json::Value>) -> Option<String> {
    use serde_json::Value;

    match field? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn or_zero(field: Option<String>) -> String {
    field.unwrap_or_else(|| "0".to_string())
}

/// Decode `text`, accepting ticker updates only for `topic`.
pub fn decode_frame(text: &str, topic: &str) -> Result<Frame, FrameError> {
    let raw: RawFrame = serde_json::from_str(text)?;

    let actual = match raw.topic {
        Some(t) => t,
        None => {
            return match raw.op {
                Some(op) => Ok(Frame::Control(ControlFrame {
                    op,
                    success: raw.success,
                    ret_msg: raw.ret_msg,
                })),
                None => Err(FrameError::Unrecognized),
            };
        }
    };

    if actual != topic {
        return Err(FrameError::TopicMismatch {
            expected: topic.to_string(),
            actual,
        });
    }

    let data = match raw.data {
        Some(v) if !v.is_null() => v,
        _ => return Err(FrameError::MissingData),
    };
    let payload: TickerPayload = serde_json::from_value(data)?;

    let last_price =
        field_text(payload.last_price).ok_or(FrameError::IncompleteTicker("lastPrice"))?;
    let high_price_24h =
        field_text(payload.high_price_24h).ok_or(FrameError::IncompleteTicker("highPrice24h"))?;
    let low_price_24h =
        field_text(payload.low_price_24h).ok_or(FrameError::IncompleteTicker("lowPrice24h"))?;
    let timestamp = raw.ts.ok_or(FrameError::MissingTimestamp)?;

    Ok(Frame::Ticker(TickerSnapshot {
        last_price,
        high_price_24h,
        low_price_24h,
        turnover_24h: or_zero(field_text(payload.turnover_24h)),
        price_24h_pcnt: or_zero(field_text(payload.price_24h_pcnt)),
        volume_24h: or_zero(field_text(payload.volume_24h)),
        timestamp,
    }))
}

/// History sample for a normalized last price, if it parses
pub fn price_sample(last_price: &str) -> Option<f64> {
    last_price.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}
