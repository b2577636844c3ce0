//! Attendance timing state machine.
//!
//! Each (guard, shift) pair moves `NotStarted -> CheckedIn -> CheckedOut`.
//! The transitions here are pure: they take the current record and the shift
//! window and return the next record plus how far the guard was off schedule.
//! Storage enforces the same transitions atomically; see
//! [`crate::domain::ports::AttendanceRepository`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AttendanceId, Coordinate, GuardId, Shift, ShiftId};

/// Default number of minutes a guard may be late or leave early before an
/// alert is raised.
pub const DEFAULT_THRESHOLD_MINUTES: i64 = 15;

/// Where a (guard, shift) pair sits in the attendance lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceState {
    /// No check-in recorded.
    NotStarted,
    /// Checked in, not yet checked out.
    CheckedIn,
    /// Checked out. Terminal.
    CheckedOut,
}

/// Punctuality recorded at check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Arrived on or before the scheduled start.
    Present,
    /// Arrived after the scheduled start.
    Late,
    /// Never arrived. Set by scheduling, not by this core.
    Absent,
}

impl AttendanceStatus {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Late => "late",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`AttendanceStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attendance status: {0}")]
pub struct ParseAttendanceStatusError(String);

impl FromStr for AttendanceStatus {
    type Err = ParseAttendanceStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "present" => Ok(Self::Present),
            "late" => Ok(Self::Late),
            "absent" => Ok(Self::Absent),
            other => Err(ParseAttendanceStatusError(other.to_owned())),
        }
    }
}

/// Rejected attendance transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttendanceError {
    /// A check-in already exists for this shift.
    #[error("guard has already checked in for this shift")]
    AlreadyCheckedIn,
    /// Check-out attempted without a check-in.
    #[error("guard has not checked in for this shift")]
    NotCheckedIn,
    /// A check-out already exists for this shift.
    #[error("guard has already checked out of this shift")]
    AlreadyCheckedOut,
    /// Check-out instant precedes the recorded check-in.
    #[error("check-out time precedes check-in time")]
    CheckOutBeforeCheckIn,
}

impl AttendanceError {
    /// Machine-readable code surfaced in error details.
    pub fn code(self) -> &'static str {
        match self {
            Self::AlreadyCheckedIn => "already_checked_in",
            Self::NotCheckedIn => "not_checked_in",
            Self::AlreadyCheckedOut => "already_checked_out",
            Self::CheckOutBeforeCheckIn => "check_out_before_check_in",
        }
    }
}

/// Thresholds that turn lateness or early departure into alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendancePolicy {
    /// Minutes late beyond which a `late_arrival` alert is raised.
    pub late_threshold_minutes: i64,
    /// Minutes early beyond which an `early_departure` alert is raised.
    pub early_departure_threshold_minutes: i64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            late_threshold_minutes: DEFAULT_THRESHOLD_MINUTES,
            early_departure_threshold_minutes: DEFAULT_THRESHOLD_MINUTES,
        }
    }
}

impl AttendancePolicy {
    /// Whether `late_minutes` warrants a `late_arrival` alert.
    pub fn should_alert_late(&self, late_minutes: i64) -> bool {
        late_minutes > self.late_threshold_minutes
    }

    /// Whether `early_minutes` warrants an `early_departure` alert.
    pub fn should_alert_early(&self, early_minutes: i64) -> bool {
        early_minutes > self.early_departure_threshold_minutes
    }
}

/// Attendance record for one guard on one shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    /// Record identifier.
    pub id: AttendanceId,
    /// Guard the record belongs to.
    pub guard_id: GuardId,
    /// Shift the record belongs to.
    pub shift_id: ShiftId,
    /// Check-in instant.
    pub check_in_time: Option<DateTime<Utc>>,
    /// Position at check-in.
    pub check_in_position: Option<Coordinate>,
    /// Check-out instant.
    pub check_out_time: Option<DateTime<Utc>>,
    /// Position at check-out.
    pub check_out_position: Option<Coordinate>,
    /// Punctuality.
    pub status: AttendanceStatus,
}

impl Attendance {
    /// Lifecycle state derived from the recorded instants.
    pub fn state(&self) -> AttendanceState {
        match (self.check_in_time, self.check_out_time) {
            (_, Some(_)) => AttendanceState::CheckedOut,
            (Some(_), None) => AttendanceState::CheckedIn,
            (None, None) => AttendanceState::NotStarted,
        }
    }
}

/// A timestamped position supplied with a check-in or check-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttendanceEvent {
    /// Instant of the event.
    pub at: DateTime<Utc>,
    /// Position of the guard.
    pub position: Coordinate,
}

/// Outcome of a check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInOutcome {
    /// Record after the check-in.
    pub attendance: Attendance,
    /// Whole minutes past the scheduled start; zero when on time.
    pub late_minutes: i64,
}

/// Outcome of a check-out.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutOutcome {
    /// Record after the check-out.
    pub attendance: Attendance,
    /// Whole minutes before the scheduled end; zero when not early.
    pub early_minutes: i64,
}

/// Whole minutes `later` is after `earlier`, rounded down; zero if not after.
fn whole_minutes_after(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    if later <= earlier {
        return 0;
    }
    (later - earlier).num_seconds().div_euclid(60)
}

/// Punctuality of a check-in at `at` for `shift`.
///
/// # Examples
/// ```
/// use chrono::{Duration, Utc};
/// use guardpost_backend::domain::{
///     AttendanceStatus, GuardId, PostId, Shift, ShiftId, ShiftStatus, classify_check_in,
/// };
///
/// let start = Utc::now();
/// let shift = Shift {
///     id: ShiftId::random(),
///     guard_id: GuardId::random(),
///     post_id: PostId::random(),
///     start_time: start,
///     end_time: start + Duration::hours(8),
///     status: ShiftStatus::InProgress,
/// };
/// let (status, minutes) = classify_check_in(&shift, start + Duration::seconds(20 * 60 + 59));
/// assert_eq!(status, AttendanceStatus::Late);
/// assert_eq!(minutes, 20);
/// ```
pub fn classify_check_in(shift: &Shift, at: DateTime<Utc>) -> (AttendanceStatus, i64) {
    if at > shift.start_time {
        (AttendanceStatus::Late, whole_minutes_after(at, shift.start_time))
    } else {
        (AttendanceStatus::Present, 0)
    }
}

/// Whole minutes a check-out at `at` precedes the end of `shift`.
pub fn early_departure_minutes(shift: &Shift, at: DateTime<Utc>) -> i64 {
    whole_minutes_after(shift.end_time, at)
}

/// Apply a check-in to the current record, if any.
pub fn check_in(
    current: Option<&Attendance>,
    id: AttendanceId,
    shift: &Shift,
    event: AttendanceEvent,
) -> Result<CheckInOutcome, AttendanceError> {
    if current.is_some_and(|record| record.check_in_time.is_some()) {
        return Err(AttendanceError::AlreadyCheckedIn);
    }
    let (status, late_minutes) = classify_check_in(shift, event.at);
    let attendance = Attendance {
        id: current.map_or(id, |record| record.id),
        guard_id: shift.guard_id,
        shift_id: shift.id,
        check_in_time: Some(event.at),
        check_in_position: Some(event.position),
        check_out_time: None,
        check_out_position: None,
        status,
    };
    Ok(CheckInOutcome {
        attendance,
        late_minutes,
    })
}

/// Apply a check-out to the current record.
pub fn check_out(
    current: Option<&Attendance>,
    shift: &Shift,
    event: AttendanceEvent,
) -> Result<CheckOutOutcome, AttendanceError> {
    let record = current.ok_or(AttendanceError::NotCheckedIn)?;
    let checked_in_at = match record.state() {
        AttendanceState::NotStarted => return Err(AttendanceError::NotCheckedIn),
        AttendanceState::CheckedOut => return Err(AttendanceError::AlreadyCheckedOut),
        AttendanceState::CheckedIn => record.check_in_time,
    };
    if checked_in_at.is_some_and(|checked_in| event.at < checked_in) {
        return Err(AttendanceError::CheckOutBeforeCheckIn);
    }
    let attendance = Attendance {
        check_out_time: Some(event.at),
        check_out_position: Some(event.position),
        ..record.clone()
    };
    Ok(CheckOutOutcome {
        attendance,
        early_minutes: early_departure_minutes(shift, event.at),
    })
}
