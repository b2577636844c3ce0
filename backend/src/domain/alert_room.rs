//! Real-time alert rooms and the event shape pushed into them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Alert, AlertId, AlertSeverity, AlertType, GuardId, TenantId, UserId};

/// Subscription key for real-time alert delivery.
///
/// Rooms render as `guard-{id}`, `user-{id}` and `tenant-{id}`.
///
/// # Examples
/// ```
/// use guardpost_backend::domain::{AlertRoom, GuardId};
///
/// let guard = GuardId::random();
/// let room: AlertRoom = format!("guard-{guard}").parse()?;
/// assert_eq!(room, AlertRoom::Guard(guard));
/// # Ok::<(), guardpost_backend::domain::AlertRoomParseError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertRoom {
    /// Everything about one guard.
    Guard(GuardId),
    /// Alerts triggered by one user's submissions.
    User(UserId),
    /// Everything within one tenant.
    Tenant(TenantId),
}

impl fmt::Display for AlertRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guard(id) => write!(f, "guard-{id}"),
            Self::User(id) => write!(f, "user-{id}"),
            Self::Tenant(id) => write!(f, "tenant-{id}"),
        }
    }
}

/// Error returned when a room name is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlertRoomParseError {
    /// The prefix is not one of `guard`, `user` or `tenant`.
    #[error("unknown room kind in {0:?}")]
    UnknownKind(String),
    /// The suffix is not a UUID.
    #[error("room {0:?} does not end in a valid UUID")]
    InvalidId(String),
}

impl FromStr for AlertRoom {
    type Err = AlertRoomParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || AlertRoomParseError::InvalidId(value.to_owned());
        let (kind, id) = value
            .split_once('-')
            .ok_or_else(|| AlertRoomParseError::UnknownKind(value.to_owned()))?;
        match kind {
            "guard" => GuardId::new(id).map(Self::Guard).map_err(|_| invalid()),
            "user" => UserId::new(id).map(Self::User).map_err(|_| invalid()),
            "tenant" => TenantId::new(id).map(Self::Tenant).map_err(|_| invalid()),
            _ => Err(AlertRoomParseError::UnknownKind(value.to_owned())),
        }
    }
}

/// Payload pushed to real-time subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    /// Persisted alert identifier.
    pub id: AlertId,
    /// Category.
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Human-readable message.
    pub message: String,
    /// Urgency.
    pub severity: AlertSeverity,
    /// Guard the alert is about.
    pub guard_id: GuardId,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl From<&Alert> for AlertEvent {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id,
            alert_type: alert.alert_type,
            message: alert.message.clone(),
            severity: alert.severity,
            guard_id: alert.guard_id,
            created_at: alert.created_at,
        }
    }
}

/// Who a field operations request is acting for.
///
/// Handlers build this from the session and pass it down explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldOpsContext {
    /// Authenticated user, when known.
    pub user_id: Option<UserId>,
    /// Tenant of the authenticated user, when known.
    pub tenant_id: Option<TenantId>,
}

impl FieldOpsContext {
    /// Rooms an alert about `guard_id` should be published to.
    pub fn rooms_for(&self, guard_id: GuardId) -> Vec<AlertRoom> {
        let mut rooms = vec![AlertRoom::Guard(guard_id)];
        rooms.extend(self.user_id.map(AlertRoom::User));
        rooms.extend(self.tenant_id.map(AlertRoom::Tenant));
        rooms
    }
}
