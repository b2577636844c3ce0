//! Push notifications.
//!
//! The client subscribes once, shows every inbound push on the platform
//! surface, and routes notification actions: `explore` opens the dashboard,
//! anything else dismisses the notification.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::SyncError;

/// Title used when a push carries only a body.
pub const DEFAULT_TITLE: &str = "Guardpost";
/// Body used when a push carries no data.
pub const DEFAULT_BODY: &str = "New notification";
/// Icon shown with every notification.
pub const DEFAULT_ICON: &str = "/icons/icon-192.png";
/// Action opening the dashboard.
pub const EXPLORE_ACTION: &str = "explore";
/// Action dismissing the notification.
pub const CLOSE_ACTION: &str = "close";

/// Bookkeeping carried with a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushData {
    /// Arrival instant in milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    /// Notification key.
    pub primary_key: u32,
}

/// A button offered on the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushAction {
    /// Action identifier reported back on click.
    pub action: String,
    /// Button label.
    pub title: String,
}

/// Notification shown for an inbound push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    /// Heading.
    pub title: String,
    /// Message text.
    pub body: String,
    /// Icon path.
    pub icon: String,
    /// Bookkeeping.
    pub data: PushData,
    /// Offered actions.
    pub actions: Vec<PushAction>,
}

#[derive(Deserialize)]
struct InboundPush {
    title: Option<String>,
    body: Option<String>,
}

impl PushPayload {
    /// Build the notification for a push carrying `text`.
    ///
    /// `text` may be a JSON object with optional `title` and `body` fields or
    /// plain text used as the body.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use guardpost_sync::PushPayload;
    ///
    /// let at = Utc.timestamp_millis_opt(1_700_000_000_000).single().expect("instant");
    /// let payload = PushPayload::from_push(Some("Guard left Dock gate"), at);
    /// assert_eq!(payload.body, "Guard left Dock gate");
    /// assert_eq!(payload.data.date_of_arrival, 1_700_000_000_000);
    /// assert_eq!(payload.actions[0].action, "explore");
    /// ```
    #[must_use]
    pub fn from_push(text: Option<&str>, arrived_at: chrono::DateTime<chrono::Utc>) -> Self {
        let parsed = text.and_then(|raw| serde_json::from_str::<InboundPush>(raw).ok());
        let (title, body) = match (parsed, text) {
            (Some(inbound), _) => (
                inbound.title.unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
                inbound.body.unwrap_or_else(|| DEFAULT_BODY.to_owned()),
            ),
            (None, Some(raw)) if !raw.trim().is_empty() => {
                (DEFAULT_TITLE.to_owned(), raw.to_owned())
            }
            (None, _) => (DEFAULT_TITLE.to_owned(), DEFAULT_BODY.to_owned()),
        };
        Self {
            title,
            body,
            icon: DEFAULT_ICON.to_owned(),
            data: PushData {
                date_of_arrival: arrived_at.timestamp_millis(),
                primary_key: 1,
            },
            actions: vec![
                PushAction {
                    action: EXPLORE_ACTION.to_owned(),
                    title: "View details".to_owned(),
                },
                PushAction {
                    action: CLOSE_ACTION.to_owned(),
                    title: "Close".to_owned(),
                },
            ],
        }
    }
}

/// Platform push subscription handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSubscription {
    /// Endpoint the server pushes to.
    pub endpoint: String,
}

/// What a notification click led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushNavigation {
    /// The route was opened.
    Opened(String),
    /// The notification was dismissed.
    Dismissed,
}

/// Platform notification surface.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Register for pushes.
    async fn subscribe(&self) -> Result<PushSubscription, SyncError>;

    /// Display a notification.
    async fn show(&self, payload: &PushPayload) -> Result<(), SyncError>;

    /// Open a client route.
    async fn open(&self, route: &str) -> Result<(), SyncError>;
}

/// Subscribes once and reacts to pushes and notification clicks.
pub struct PushHandler<P> {
    platform: Arc<P>,
    clock: Arc<dyn Clock>,
    dashboard_route: String,
    subscription: OnceCell<PushSubscription>,
}

impl<P> PushHandler<P>
where
    P: PushPlatform,
{
    /// Create a handler opening `dashboard_route` on `explore`.
    pub fn new(
        platform: Arc<P>,
        clock: Arc<dyn Clock>,
        dashboard_route: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            clock,
            dashboard_route: dashboard_route.into(),
            subscription: OnceCell::new(),
        }
    }

    /// Subscribe on first call; later calls return the same subscription.
    ///
    /// # Errors
    ///
    /// Propagates the platform's subscription failure; a failed attempt is
    /// retried on the next call.
    pub async fn ensure_subscribed(&self) -> Result<&PushSubscription, SyncError> {
        self.subscription
            .get_or_try_init(|| async {
                let subscription = self.platform.subscribe().await?;
                info!(endpoint = %subscription.endpoint, "push subscription registered");
                Ok::<_, SyncError>(subscription)
            })
            .await
    }

    /// Show the notification for an inbound push.
    ///
    /// # Errors
    ///
    /// Propagates the platform's display failure.
    pub async fn on_push(&self, text: Option<&str>) -> Result<PushPayload, SyncError> {
        let payload = PushPayload::from_push(text, self.clock.utc());
        self.platform.show(&payload).await?;
        Ok(payload)
    }

    /// React to a click on `action`.
    ///
    /// # Errors
    ///
    /// Propagates the platform's failure to open the dashboard.
    pub async fn on_action(&self, action: &str) -> Result<PushNavigation, SyncError> {
        if action == EXPLORE_ACTION {
            self.platform.open(&self.dashboard_route).await?;
            return Ok(PushNavigation::Opened(self.dashboard_route.clone()));
        }
        debug!(action, "notification dismissed");
        Ok(PushNavigation::Dismissed)
    }
}
