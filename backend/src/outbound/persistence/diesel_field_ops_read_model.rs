//! PostgreSQL-backed `FieldOpsReadModel`.
//!
//! Shifts, geofences and guards belong to scheduling; this adapter only
//! selects from their tables.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{FieldOpsReadModel, FieldOpsReadModelError};
use crate::domain::{Geofence, GuardId, GuardProfile, PostId, Shift, ShiftId, ShiftStatus};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{GeofenceRow, GuardRow, ShiftRow};
use super::pool::DbPool;
use super::schema::{geofences, guards, shifts};

/// Diesel read model over the scheduling tables.
#[derive(Clone)]
pub struct DieselFieldOpsReadModel {
    pool: DbPool,
}

impl DieselFieldOpsReadModel {
    /// Create a read model over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn connection(
        &self,
    ) -> Result<
        diesel_async::pooled_connection::bb8::PooledConnection<'_, diesel_async::AsyncPgConnection>,
        FieldOpsReadModelError,
    > {
        self.pool
            .get()
            .await
            .map_err(|err| map_pool_error(&err, FieldOpsReadModelError::connection))
    }
}

fn diesel_error(error: &diesel::result::Error) -> FieldOpsReadModelError {
    map_diesel_error(
        error,
        FieldOpsReadModelError::query,
        FieldOpsReadModelError::connection,
    )
}

fn decode<R, D>(row: R) -> Result<D, FieldOpsReadModelError>
where
    D: TryFrom<R>,
    D::Error: std::fmt::Display,
{
    D::try_from(row).map_err(|err| FieldOpsReadModelError::query(err.to_string()))
}

#[async_trait]
impl FieldOpsReadModel for DieselFieldOpsReadModel {
    async fn find_in_progress_shift(
        &self,
        guard_id: &GuardId,
    ) -> Result<Option<Shift>, FieldOpsReadModelError> {
        let mut conn = self.connection().await?;
        // Overlapping shifts should not exist; if they do, the latest start wins.
        let row = shifts::table
            .filter(shifts::guard_id.eq(guard_id.as_uuid()))
            .filter(shifts::status.eq(ShiftStatus::InProgress.as_str()))
            .order(shifts::start_time.desc())
            .select(ShiftRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        row.map(decode).transpose()
    }

    async fn find_shift(
        &self,
        shift_id: &ShiftId,
    ) -> Result<Option<Shift>, FieldOpsReadModelError> {
        let mut conn = self.connection().await?;
        let row = shifts::table
            .find(shift_id.as_uuid())
            .select(ShiftRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        row.map(decode).transpose()
    }

    async fn list_post_geofences(
        &self,
        post_id: &PostId,
    ) -> Result<Vec<Geofence>, FieldOpsReadModelError> {
        let mut conn = self.connection().await?;
        let rows = geofences::table
            .filter(geofences::post_id.eq(post_id.as_uuid()))
            .filter(geofences::is_active.eq(true))
            .order(geofences::name.asc())
            .select(GeofenceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| diesel_error(&err))?;
        rows.into_iter().map(decode).collect()
    }

    async fn find_guard(
        &self,
        guard_id: &GuardId,
    ) -> Result<Option<GuardProfile>, FieldOpsReadModelError> {
        let mut conn = self.connection().await?;
        let row = guards::table
            .find(guard_id.as_uuid())
            .select(GuardRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        Ok(row.map(GuardProfile::from))
    }
}
