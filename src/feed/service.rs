//! Async runtime for [`TickerFeed`]
//!
//! One task owns the feed, the current socket session and the retry timer.
//! Everything else talks to it through a [`FeedHandle`].

use super::ticker::{FeedSettings, TickerFeed};
use super::types::{ConnectionId, FeedAction, FeedEvent, FeedView, RetryId};
use crate::ws::{Connector, WsMessage, WsSession};
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};

/// Errors from talking to a running feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed task has stopped")]
    Stopped,
    #[error("feed task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Start,
    Reconnect,
    Shutdown,
}

struct ActiveSession {
    conn: ConnectionId,
    session: WsSession,
}

struct PendingRetry {
    retry: RetryId,
    timer: Pin<Box<Sleep>>,
}

/// Drives a [`TickerFeed`] over a real (or fake) transport
pub struct FeedService<C> {
    feed: TickerFeed,
    connector: C,
    session: Option<ActiveSession>,
    retry: Option<PendingRetry>,
}

impl<C: Connector + 'static> FeedService<C> {
    pub fn new(settings: FeedSettings, connector: C) -> Self {
        Self {
            feed: TickerFeed::new(settings),
            connector,
            session: None,
            retry: None,
        }
    }

    /// Start the feed on the current tokio runtime
    pub fn spawn(self) -> FeedHandle {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (view_tx, view_rx) = watch::channel(self.feed.view());

        let task = tokio::spawn(async move {
            self.run(command_rx, view_tx).await;
        });

        FeedHandle {
            commands: command_tx,
            view: view_rx,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>, view_tx: watch::Sender<FeedView>) {
        self.dispatch(FeedEvent::Start).await;
        self.publish(&view_tx);

        loop {
            let event = tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Start) => FeedEvent::Start,
                    Some(Command::Reconnect) => FeedEvent::Reconnect,
                    Some(Command::Shutdown) | None => {
                        self.dispatch(FeedEvent::Shutdown).await;
                        self.publish(&view_tx);
                        break;
                    }
                },

                (conn, msg) = next_message(&mut self.session) => match msg {
                    Some(WsMessage::Connected) => FeedEvent::Opened { conn },
                    Some(WsMessage::Text(text)) => FeedEvent::Frame { conn, text },
                    Some(WsMessage::Binary(data)) => {
                        tracing::debug!(len = data.len(), "Ignoring binary frame");
                        continue;
                    }
                    Some(WsMessage::Disconnected { error }) => {
                        self.session = None;
                        FeedEvent::Closed { conn, error }
                    }
                    None => {
                        self.session = None;
                        FeedEvent::Closed {
                            conn,
                            error: Some("transport task ended".to_string()),
                        }
                    }
                },

                retry = next_retry(&mut self.retry) => {
                    self.retry = None;
                    FeedEvent::RetryElapsed { retry }
                }
            };

            self.dispatch(event).await;
            self.publish(&view_tx);
        }

        tracing::info!("Ticker feed stopped");
    }

    async fn dispatch(&mut self, event: FeedEvent) {
        for action in self.feed.handle_event(event) {
            self.apply(action).await;
        }
    }

    async fn apply(&mut self, action: FeedAction) {
        match action {
            FeedAction::Connect { conn } => {
                let session = self.connector.open().await;
                self.session = Some(ActiveSession { conn, session });
            }
            FeedAction::Send { conn, text } => match &self.session {
                Some(active) if active.conn == conn => {
                    if active.session.outbound.send(text).await.is_err() {
                        tracing::warn!(conn = conn.0, "Session closed before send");
                    }
                }
                _ => tracing::debug!(conn = conn.0, "Send for inactive connection dropped"),
            },
            FeedAction::Close { conn } => {
                if self.session.as_ref().is_some_and(|s| s.conn == conn) {
                    // dropping the session closes the socket
                    self.session = None;
                }
            }
            FeedAction::ScheduleRetry { retry, delay } => {
                self.retry = Some(PendingRetry {
                    retry,
                    timer: Box::pin(sleep(delay)),
                });
            }
            FeedAction::CancelRetry { retry } => {
                if self.retry.as_ref().is_some_and(|p| p.retry == retry) {
                    self.retry = None;
                }
            }
        }
    }

    fn publish(&self, view_tx: &watch::Sender<FeedView>) {
        let next = self.feed.view();
        view_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn next_message(session: &mut Option<ActiveSession>) -> (ConnectionId, Option<WsMessage>) {
    match session {
        Some(active) => {
            let conn = active.conn;
            (conn, active.session.events.recv().await)
        }
        None => std::future::pending().await,
    }
}

async fn next_retry(pending: &mut Option<PendingRetry>) -> RetryId {
    match pending {
        Some(p) => {
            p.timer.as_mut().await;
            p.retry
        }
        None => std::future::pending().await,
    }
}

/// Handle to a running feed.
///
/// Dropping the handle shuts the feed down.
pub struct FeedHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<FeedView>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// Latest published state
    pub fn view(&self) -> FeedView {
        self.view.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.view.borrow().is_connected
    }

    /// Receiver notified whenever the view changes
    pub fn changes(&self) -> watch::Receiver<FeedView> {
        self.view.clone()
    }

    /// Open a connection if none is active
    pub async fn start(&self) -> Result<(), FeedError> {
        self.send(Command::Start).await
    }

    /// Drop the current connection and any pending retry, reset the attempt
    /// counter and connect again immediately
    pub async fn reconnect(&self) -> Result<(), FeedError> {
        self.send(Command::Reconnect).await
    }

    /// Stop the feed and wait for its task to finish
    pub async fn shutdown(self) -> Result<(), FeedError> {
        // a stopped task is already shut down
        let _ = self.commands.send(Command::Shutdown).await;
        self.task.await?;
        Ok(())
    }

    async fn send(&self, command: Command) -> Result<(), FeedError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| FeedError::Stopped)
    }
}
