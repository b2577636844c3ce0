//! Per-connection alert stream.
//!
//! Forwards every event from the room feed as a JSON text frame. The server
//! pings every 5s and drops a connection after 10s without client traffic;
//! tests shorten both intervals.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::time;
use tracing::{info, warn};

use crate::domain::{AlertEvent, AlertRoom};

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn stream_alerts(
    room: AlertRoom,
    events: BoxStream<'static, AlertEvent>,
    session: Session,
    messages: MessageStream,
) {
    AlertStream { room, events }.run(session, messages).await;
}

enum StreamEnd {
    ClientClosed(Option<CloseReason>),
    ClientGone,
    FeedClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
}

impl StreamEnd {
    fn close_reason(self) -> Option<Option<CloseReason>> {
        let reason = |code, description: &str| {
            Some(CloseReason {
                code,
                description: Some(description.to_owned()),
            })
        };
        match self {
            Self::ClientClosed(reason) => Some(reason),
            Self::HeartbeatTimeout => Some(reason(CloseCode::Normal, "heartbeat timeout")),
            Self::Protocol(_) => Some(reason(CloseCode::Protocol, "protocol error")),
            Self::FeedClosed => Some(reason(CloseCode::Away, "alert feed closed")),
            Self::ClientGone | Self::Network(_) => None,
        }
    }
}

struct AlertStream {
    room: AlertRoom,
    events: BoxStream<'static, AlertEvent>,
}

impl AlertStream {
    async fn run(mut self, mut session: Session, mut messages: MessageStream) {
        let mut last_seen = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        let end = loop {
            let step = tokio::select! {
                _ = heartbeat.tick() => Self::heartbeat(&mut session, last_seen).await,
                message = messages.recv() => {
                    Self::client_message(&mut session, &mut last_seen, message).await
                }
                event = self.events.next() => Self::forward(&mut session, event).await,
            };
            if let Err(end) = step {
                break end;
            }
        };

        self.log_end(&end);
        if let Some(reason) = end.close_reason() {
            if let Err(error) = session.close(reason).await {
                warn!(room = %self.room, error = %error, "Failed to close WebSocket session");
            }
        }
    }

    async fn heartbeat(session: &mut Session, last_seen: Instant) -> Result<(), StreamEnd> {
        if last_seen.elapsed() > CLIENT_TIMEOUT {
            return Err(StreamEnd::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(StreamEnd::Network)
    }

    async fn client_message(
        session: &mut Session,
        last_seen: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), StreamEnd> {
        let message = message
            .ok_or(StreamEnd::ClientGone)?
            .map_err(StreamEnd::Protocol)?;
        *last_seen = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(StreamEnd::Network),
            Message::Close(reason) => Err(StreamEnd::ClientClosed(reason)),
            Message::Text(_)
            | Message::Binary(_)
            | Message::Pong(_)
            | Message::Continuation(_)
            | Message::Nop => Ok(()),
        }
    }

    async fn forward(session: &mut Session, event: Option<AlertEvent>) -> Result<(), StreamEnd> {
        let event = event.ok_or(StreamEnd::FeedClosed)?;
        match serde_json::to_string(&event) {
            Ok(body) => session.text(body).await.map_err(StreamEnd::Network),
            Err(error) => {
                warn!(alert_id = %event.id, error = %error, "Failed to serialize alert event");
                Ok(())
            }
        }
    }

    fn log_end(&self, end: &StreamEnd) {
        let room = &self.room;
        match end {
            StreamEnd::HeartbeatTimeout => warn!(%room, "alert stream heartbeat timeout"),
            StreamEnd::Protocol(error) => warn!(%room, error = %error, "WebSocket protocol error"),
            StreamEnd::Network(error) => warn!(%room, error = %error, "WebSocket send failed"),
            StreamEnd::FeedClosed => warn!(%room, "alert feed closed"),
            StreamEnd::ClientClosed(_) | StreamEnd::ClientGone => {
                info!(%room, "alert stream closed by client");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
