//! ticker-feed: live cryptocurrency ticker over the Bybit v5 public stream
//!
//! This library provides:
//! - A sans-IO ticker feed state machine (subscription, frame validation,
//!   rolling price history, bounded exponential reconnect)
//! - A tokio driver that runs the feed over a WebSocket transport
//! - Configuration, CLI and logging for the `ticker-feed` binary

pub mod cli;
pub mod config;
pub mod feed;
pub mod telemetry;
pub mod ws;
