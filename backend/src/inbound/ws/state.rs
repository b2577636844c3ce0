//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::domain::ports::AlertFeed;

/// Dependency bundle for the alert stream endpoint.
#[derive(Clone)]
pub struct WsState {
    pub feed: Arc<dyn AlertFeed>,
}

impl WsState {
    pub fn new(feed: Arc<dyn AlertFeed>) -> Self {
        Self { feed }
    }
}
