//! Process-wide alert hub over a tokio broadcast channel.
//!
//! Every subscriber receives every event and keeps only those for its room.
//! A subscriber that falls more than `capacity` events behind skips the
//! oldest ones and logs how many it lost.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::domain::ports::{AlertBroadcastError, AlertBroadcaster, AlertFeed};
use crate::domain::{AlertEvent, AlertRoom};

/// Events buffered per subscriber before it starts lagging.
pub const DEFAULT_HUB_CAPACITY: usize = 256;

/// Broadcast hub implementing both [`AlertBroadcaster`] and [`AlertFeed`].
///
/// Construct once at startup and share through `Arc`.
#[derive(Debug, Clone)]
pub struct AlertHub {
    sender: broadcast::Sender<(AlertRoom, AlertEvent)>,
}

impl AlertHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of live subscriptions across all rooms.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AlertHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

#[async_trait]
impl AlertBroadcaster for AlertHub {
    async fn publish(&self, room: &AlertRoom, event: &AlertEvent) -> Result<(), AlertBroadcastError> {
        if self.sender.send((*room, event.clone())).is_err() {
            debug!(%room, alert_id = %event.id, "no alert subscribers");
        }
        Ok(())
    }
}

impl AlertFeed for AlertHub {
    fn subscribe(&self, room: &AlertRoom) -> BoxStream<'static, AlertEvent> {
        let room = *room;
        Box::pin(stream::unfold(self.sender.subscribe(), move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok((target, event)) if target == room => return Some((event, rx)),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%room, skipped, "alert subscriber lagged; events dropped");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }))
    }
}
