//! PostgreSQL-backed `AlertRepository`.
//!
//! Breach episodes rely on the partial unique index
//! `alerts_open_episode_key`: opening an episode is a single
//! `INSERT … ON CONFLICT DO NOTHING`, so concurrent reports for the same
//! guard and geofence cannot both open one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AlertRepository, AlertRepositoryError};
use crate::domain::{Alert, AlertStatus, AlertType, GeofenceId, GuardId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::AlertRow;
use super::pool::DbPool;
use super::schema::alerts;

/// Diesel-backed alert store.
#[derive(Clone)]
pub struct DieselAlertRepository {
    pool: DbPool,
}

impl DieselAlertRepository {
    /// Create a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn diesel_error(error: &diesel::result::Error) -> AlertRepositoryError {
    map_diesel_error(
        error,
        AlertRepositoryError::query,
        AlertRepositoryError::connection,
    )
}

#[async_trait]
impl AlertRepository for DieselAlertRepository {
    async fn create(&self, alert: &Alert) -> Result<(), AlertRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(&err, AlertRepositoryError::connection))?;
        diesel::insert_into(alerts::table)
            .values(AlertRow::from(alert))
            .execute(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        Ok(())
    }

    async fn create_open_episode(&self, alert: &Alert) -> Result<bool, AlertRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(&err, AlertRepositoryError::connection))?;
        let inserted = diesel::insert_into(alerts::table)
            .values(AlertRow::opening_episode(alert))
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        Ok(inserted == 1)
    }

    async fn find_active(
        &self,
        guard_id: &GuardId,
        geofence_id: &GeofenceId,
        alert_type: AlertType,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(&err, AlertRepositoryError::connection))?;
        let row = alerts::table
            .filter(alerts::guard_id.eq(guard_id.as_uuid()))
            .filter(alerts::geofence_id.eq(geofence_id.as_uuid()))
            .filter(alerts::alert_type.eq(alert_type.as_str()))
            .filter(alerts::status.eq(AlertStatus::Active.as_str()))
            .order(alerts::created_at.desc())
            .select(AlertRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        row.map(Alert::try_from)
            .transpose()
            .map_err(|err| AlertRepositoryError::query(err.to_string()))
    }

    async fn resolve_active(
        &self,
        guard_id: &GuardId,
        geofence_id: &GeofenceId,
        alert_type: AlertType,
        resolved_at: DateTime<Utc>,
    ) -> Result<usize, AlertRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(&err, AlertRepositoryError::connection))?;
        let updated = diesel::update(
            alerts::table
                .filter(alerts::guard_id.eq(guard_id.as_uuid()))
                .filter(alerts::geofence_id.eq(geofence_id.as_uuid()))
                .filter(alerts::alert_type.eq(alert_type.as_str()))
                .filter(alerts::status.eq(AlertStatus::Active.as_str())),
        )
        .set((
            alerts::status.eq(AlertStatus::Resolved.as_str()),
            alerts::resolved_at.eq(Some(resolved_at)),
        ))
        .execute(&mut conn)
        .await
        .map_err(|err| diesel_error(&err))?;
        Ok(updated)
    }
}
