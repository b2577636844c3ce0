//! PostgreSQL-backed `AttendanceRepository`.
//!
//! Both writes are single conditional statements against the
//! `(guard_id, shift_id)` unique key. A statement that matches no row
//! returns `Ok(None)` and the service decides which conflict that was.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_query;
use diesel::sql_types::{Double, Nullable, Timestamptz, Uuid as SqlUuid, Varchar};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AttendanceRepository, AttendanceRepositoryError};
use crate::domain::{Attendance, GuardId, ShiftId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::AttendanceRow;
use super::pool::DbPool;
use super::schema::attendance;

/// Diesel-backed attendance store.
#[derive(Clone)]
pub struct DieselAttendanceRepository {
    pool: DbPool,
}

impl DieselAttendanceRepository {
    /// Create a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn diesel_error(error: &diesel::result::Error) -> AttendanceRepositoryError {
    map_diesel_error(
        error,
        AttendanceRepositoryError::query,
        AttendanceRepositoryError::connection,
    )
}

/// Fills in a pre-created row that has no check-in yet. A row that already
/// carries a check-in is left alone and nothing is returned.
const UPSERT_CHECK_IN_SQL: &str = r#"
INSERT INTO attendance (
    id, guard_id, shift_id,
    check_in_time, check_in_lat, check_in_lng,
    check_out_time, check_out_lat, check_out_lng,
    status
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
ON CONFLICT (guard_id, shift_id)
DO UPDATE SET
    check_in_time = EXCLUDED.check_in_time,
    check_in_lat = EXCLUDED.check_in_lat,
    check_in_lng = EXCLUDED.check_in_lng,
    status = EXCLUDED.status
WHERE attendance.check_in_time IS NULL
RETURNING
    id, guard_id, shift_id,
    check_in_time, check_in_lat, check_in_lng,
    check_out_time, check_out_lat, check_out_lng,
    status
"#;

fn upsert_check_in_query(row: AttendanceRow) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
    sql_query(UPSERT_CHECK_IN_SQL)
        .into_boxed()
        .bind::<SqlUuid, _>(row.id)
        .bind::<SqlUuid, _>(row.guard_id)
        .bind::<SqlUuid, _>(row.shift_id)
        .bind::<Nullable<Timestamptz>, _>(row.check_in_time)
        .bind::<Nullable<Double>, _>(row.check_in_lat)
        .bind::<Nullable<Double>, _>(row.check_in_lng)
        .bind::<Nullable<Timestamptz>, _>(row.check_out_time)
        .bind::<Nullable<Double>, _>(row.check_out_lat)
        .bind::<Nullable<Double>, _>(row.check_out_lng)
        .bind::<Varchar, _>(row.status)
}

fn decode(row: Option<AttendanceRow>) -> Result<Option<Attendance>, AttendanceRepositoryError> {
    row.map(Attendance::try_from)
        .transpose()
        .map_err(|err| AttendanceRepositoryError::query(err.to_string()))
}

#[async_trait]
impl AttendanceRepository for DieselAttendanceRepository {
    async fn find_for_shift(
        &self,
        guard_id: &GuardId,
        shift_id: &ShiftId,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(&err, AttendanceRepositoryError::connection))?;
        let row = attendance::table
            .filter(attendance::guard_id.eq(guard_id.as_uuid()))
            .filter(attendance::shift_id.eq(shift_id.as_uuid()))
            .select(AttendanceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        decode(row)
    }

    async fn upsert_check_in(
        &self,
        record: &Attendance,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(&err, AttendanceRepositoryError::connection))?;
        let stored = upsert_check_in_query(AttendanceRow::from(record))
            .get_result::<AttendanceRow>(&mut conn)
            .await
            .optional()
            .map_err(|err| diesel_error(&err))?;
        decode(stored)
    }

    async fn record_check_out(
        &self,
        record: &Attendance,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(&err, AttendanceRepositoryError::connection))?;
        let stored = diesel::update(
            attendance::table
                .filter(attendance::guard_id.eq(record.guard_id.as_uuid()))
                .filter(attendance::shift_id.eq(record.shift_id.as_uuid()))
                .filter(attendance::check_in_time.is_not_null())
                .filter(attendance::check_out_time.is_null()),
        )
        .set((
            attendance::check_out_time.eq(record.check_out_time),
            attendance::check_out_lat.eq(record.check_out_position.map(|p| p.latitude())),
            attendance::check_out_lng.eq(record.check_out_position.map(|p| p.longitude())),
        ))
        .returning(AttendanceRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|err| diesel_error(&err))?;
        decode(stored)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::*;

    fn checked_in_row() -> AttendanceRow {
        AttendanceRow {
            id: uuid::Uuid::new_v4(),
            guard_id: uuid::Uuid::new_v4(),
            shift_id: uuid::Uuid::new_v4(),
            check_in_time: Utc.with_ymd_and_hms(2026, 3, 2, 9, 20, 0).single(),
            check_in_lat: Some(12.0),
            check_in_lng: Some(77.0),
            check_out_time: None,
            check_out_lat: None,
            check_out_lng: None,
            status: "late".to_owned(),
        }
    }

    #[rstest]
    fn check_in_upsert_only_fills_rows_without_a_check_in() {
        let rendered = diesel::debug_query::<Pg, _>(&upsert_check_in_query(checked_in_row()))
            .to_string();
        let compact = rendered.split_whitespace().collect::<Vec<_>>().join(" ");

        assert!(compact.contains("ON CONFLICT (guard_id, shift_id) DO UPDATE SET"));
        assert!(compact.contains("WHERE attendance.check_in_time IS NULL RETURNING"));
        assert!(!compact.contains("check_out_time = EXCLUDED"));
        assert!(compact.contains("$10"));
    }
}
