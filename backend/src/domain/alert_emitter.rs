//! Alert emission: persist first, then fan out to real-time rooms.
//!
//! The alert table is the source of truth. Publishing is a hint for
//! dashboards to refresh, so publish failures are logged and dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{AlertBroadcaster, AlertRepository, AlertRepositoryError};
use crate::domain::{
    Alert, AlertEvent, AlertId, AlertType, FieldOpsContext, GeofenceId, GuardId, NewAlert,
};

/// Persists alerts and publishes them to the process-wide hub.
#[derive(Clone)]
pub struct AlertEmitter {
    alerts: Arc<dyn AlertRepository>,
    broadcaster: Arc<dyn AlertBroadcaster>,
    clock: Arc<dyn Clock>,
}

impl AlertEmitter {
    /// Create an emitter over the alert store and the shared hub.
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        broadcaster: Arc<dyn AlertBroadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            alerts,
            broadcaster,
            clock,
        }
    }

    /// Current instant from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Persist `alert` and publish it to the rooms `ctx` implies.
    ///
    /// Returns an error only when persistence fails, in which case nothing is
    /// published.
    pub async fn emit(
        &self,
        ctx: &FieldOpsContext,
        alert: NewAlert,
    ) -> Result<Alert, AlertRepositoryError> {
        let alert = alert.into_alert(AlertId::random(), self.now());
        self.alerts.create(&alert).await?;
        self.publish(ctx, &alert).await;
        Ok(alert)
    }

    /// Open a breach episode with `alert` and publish it.
    ///
    /// Returns `None`, publishing nothing, when an episode for the same guard
    /// and geofence is already open. Storage decides this atomically, so
    /// concurrent reports open at most one episode.
    pub async fn open_episode(
        &self,
        ctx: &FieldOpsContext,
        alert: NewAlert,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        let alert = alert.into_alert(AlertId::random(), self.now());
        if !self.alerts.create_open_episode(&alert).await? {
            return Ok(None);
        }
        self.publish(ctx, &alert).await;
        Ok(Some(alert))
    }

    async fn publish(&self, ctx: &FieldOpsContext, alert: &Alert) {
        info!(
            alert_id = %alert.id,
            guard_id = %alert.guard_id,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            "alert raised"
        );
        let event = AlertEvent::from(alert);
        for room in ctx.rooms_for(alert.guard_id) {
            if let Err(error) = self.broadcaster.publish(&room, &event).await {
                warn!(alert_id = %alert.id, %room, %error, "alert publish failed");
            }
        }
    }

    /// The open breach episode for a guard and geofence, if any.
    pub async fn open_breach(
        &self,
        guard_id: &GuardId,
        geofence_id: &GeofenceId,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        self.alerts
            .find_active(guard_id, geofence_id, AlertType::GeofenceBreach)
            .await
    }

    /// Close the breach episode for a guard and geofence. Returns how many
    /// active breach alerts were resolved.
    pub async fn close_breach(
        &self,
        guard_id: &GuardId,
        geofence_id: &GeofenceId,
    ) -> Result<usize, AlertRepositoryError> {
        let resolved = self
            .alerts
            .resolve_active(guard_id, geofence_id, AlertType::GeofenceBreach, self.now())
            .await?;
        if resolved > 0 {
            info!(%guard_id, %geofence_id, resolved, "breach episode closed");
        }
        Ok(resolved)
    }
}
