//! Driving port for attendance check-in and check-out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Attendance, Error, FieldOpsContext, GuardId, ShiftId};

/// Which transition the guard is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceAction {
    /// Start of duty.
    #[serde(rename = "check-in")]
    CheckIn,
    /// End of duty.
    #[serde(rename = "check-out")]
    CheckOut,
}

/// A check-in or check-out submitted by a guard's handset.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordAttendanceRequest {
    /// Requested transition.
    pub action: AttendanceAction,
    /// Guard checking in or out.
    pub guard_id: GuardId,
    /// Shift the event belongs to.
    pub shift_id: ShiftId,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Driving port for attendance transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceCommand: Send + Sync {
    /// Apply the transition and return the updated record.
    ///
    /// Rejected transitions surface as invalid requests carrying the reason
    /// code in `details.code`; an unknown shift is not found.
    async fn record_attendance(
        &self,
        ctx: FieldOpsContext,
        request: RecordAttendanceRequest,
    ) -> Result<Attendance, Error>;
}
