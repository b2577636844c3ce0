//! Port for alert persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Alert, AlertType, GeofenceId, GuardId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by alert repository adapters.
    pub enum AlertRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "alert repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "alert repository query failed: {message}",
    }
}

/// Append-only alert store with status transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Persist a new alert.
    async fn create(&self, alert: &Alert) -> Result<(), AlertRepositoryError>;

    /// Persist `alert` as the opening alert of an episode for its guard and
    /// geofence.
    ///
    /// The check for an already open episode and the insert are one atomic
    /// step. Returns `false`, storing nothing, when an episode is already open.
    async fn create_open_episode(&self, alert: &Alert) -> Result<bool, AlertRepositoryError>;

    /// The active alert of `alert_type` for a guard and geofence, if any.
    async fn find_active(
        &self,
        guard_id: &GuardId,
        geofence_id: &GeofenceId,
        alert_type: AlertType,
    ) -> Result<Option<Alert>, AlertRepositoryError>;

    /// Resolve every active alert of `alert_type` for a guard and geofence.
    /// Returns how many alerts changed.
    async fn resolve_active(
        &self,
        guard_id: &GuardId,
        geofence_id: &GeofenceId,
        alert_type: AlertType,
        resolved_at: DateTime<Utc>,
    ) -> Result<usize, AlertRepositoryError>;
}

/// Fixture implementation that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAlertRepository;

#[async_trait]
impl AlertRepository for FixtureAlertRepository {
    async fn create(&self, _alert: &Alert) -> Result<(), AlertRepositoryError> {
        Ok(())
    }

    async fn create_open_episode(&self, _alert: &Alert) -> Result<bool, AlertRepositoryError> {
        Ok(true)
    }

    async fn find_active(
        &self,
        _guard_id: &GuardId,
        _geofence_id: &GeofenceId,
        _alert_type: AlertType,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        Ok(None)
    }

    async fn resolve_active(
        &self,
        _guard_id: &GuardId,
        _geofence_id: &GeofenceId,
        _alert_type: AlertType,
        _resolved_at: DateTime<Utc>,
    ) -> Result<usize, AlertRepositoryError> {
        Ok(0)
    }
}
