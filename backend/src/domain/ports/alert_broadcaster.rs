//! Ports for real-time alert fan-out.
//!
//! One process-wide hub implements both sides: the alert emitter publishes
//! through [`AlertBroadcaster`] and the WebSocket adapter reads through
//! [`AlertFeed`].

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};

use crate::domain::{AlertEvent, AlertRoom};

use super::define_port_error;

define_port_error! {
    /// Errors raised while publishing a real-time event.
    pub enum AlertBroadcastError {
        /// The hub could not accept the event.
        Unavailable { message: String } =>
            "alert broadcaster unavailable: {message}",
    }
}

/// Publishes alert events to rooms.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertBroadcaster: Send + Sync {
    /// Deliver `event` to subscribers of `room`. Best effort.
    async fn publish(&self, room: &AlertRoom, event: &AlertEvent)
    -> Result<(), AlertBroadcastError>;
}

/// Streams alert events for one room.
pub trait AlertFeed: Send + Sync {
    /// Events published to `room` from now on.
    fn subscribe(&self, room: &AlertRoom) -> BoxStream<'static, AlertEvent>;
}

/// Fixture broadcaster and feed with no subscribers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAlertBroadcaster;

#[async_trait]
impl AlertBroadcaster for FixtureAlertBroadcaster {
    async fn publish(
        &self,
        _room: &AlertRoom,
        _event: &AlertEvent,
    ) -> Result<(), AlertBroadcastError> {
        Ok(())
    }
}

impl AlertFeed for FixtureAlertBroadcaster {
    fn subscribe(&self, _room: &AlertRoom) -> BoxStream<'static, AlertEvent> {
        Box::pin(stream::empty())
    }
}
