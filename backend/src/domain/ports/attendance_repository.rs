//! Port for attendance persistence.
//!
//! Storage is the only concurrency guard for attendance: both writes are
//! single conditional statements keyed by (guard, shift), so two racing
//! check-ins cannot both succeed.

use async_trait::async_trait;

use crate::domain::{Attendance, GuardId, ShiftId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by attendance repository adapters.
    pub enum AttendanceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "attendance repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "attendance repository query failed: {message}",
    }
}

/// Store for attendance records, one per (guard, shift).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Current record for the pair, if one exists.
    async fn find_for_shift(
        &self,
        guard_id: &GuardId,
        shift_id: &ShiftId,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError>;

    /// Insert the check-in, or fill it into an existing row that has none.
    ///
    /// Returns `None` when the pair already has a check-in; the stored row is
    /// left untouched in that case.
    async fn upsert_check_in(
        &self,
        attendance: &Attendance,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError>;

    /// Record the check-out on a row that is checked in and not yet out.
    ///
    /// Returns `None` when no row matches that condition.
    async fn record_check_out(
        &self,
        attendance: &Attendance,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError>;
}

/// Fixture implementation that accepts every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAttendanceRepository;

#[async_trait]
impl AttendanceRepository for FixtureAttendanceRepository {
    async fn find_for_shift(
        &self,
        _guard_id: &GuardId,
        _shift_id: &ShiftId,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError> {
        Ok(None)
    }

    async fn upsert_check_in(
        &self,
        attendance: &Attendance,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError> {
        Ok(Some(attendance.clone()))
    }

    async fn record_check_out(
        &self,
        attendance: &Attendance,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError> {
        Ok(Some(attendance.clone()))
    }
}
