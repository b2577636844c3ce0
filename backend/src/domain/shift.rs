//! Shift read model and the guard profile used in alert messages.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GuardId, PostId, ShiftId};

/// Lifecycle state of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// Planned but not started.
    Scheduled,
    /// The guard is on duty.
    InProgress,
    /// The shift has ended.
    Completed,
    /// The shift was called off.
    Cancelled,
}

impl ShiftStatus {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ShiftStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shift status: {0}")]
pub struct ParseShiftStatusError(String);

impl FromStr for ShiftStatus {
    type Err = ParseShiftStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseShiftStatusError(other.to_owned())),
        }
    }
}

/// A scheduled duty window for one guard at one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    /// Shift identifier.
    pub id: ShiftId,
    /// Guard assigned to the shift.
    pub guard_id: GuardId,
    /// Post the shift covers.
    pub post_id: PostId,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
    /// Lifecycle state.
    pub status: ShiftStatus,
}

impl Shift {
    /// Whether the guard is currently on duty for this shift.
    pub fn is_in_progress(&self) -> bool {
        self.status == ShiftStatus::InProgress
    }
}

/// Guard identity as shown to dispatchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardProfile {
    /// Guard identifier.
    pub id: GuardId,
    /// Human-readable name.
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ShiftStatus::Scheduled)]
    #[case(ShiftStatus::InProgress)]
    #[case(ShiftStatus::Completed)]
    #[case(ShiftStatus::Cancelled)]
    fn storage_form_parses_back(#[case] status: ShiftStatus) {
        assert_eq!(status.as_str().parse::<ShiftStatus>(), Ok(status));
    }

    #[rstest]
    fn rejects_unknown_status() {
        assert!("paused".parse::<ShiftStatus>().is_err());
    }
}
