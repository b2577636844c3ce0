//! Location reports streamed from a guard's handset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Coordinate, GuardId, LocationReportId};

/// Validation errors raised by [`LocationReport::new`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum LocationReportValidationError {
    /// Speed was negative or not finite.
    #[error("speed must be a non-negative number: {value}")]
    InvalidSpeed {
        /// Rejected value.
        value: f64,
    },
    /// Heading was outside `[0, 360)` or not finite.
    #[error("direction must be a heading in [0, 360): {value}")]
    InvalidDirection {
        /// Rejected value.
        value: f64,
    },
}

/// Unvalidated input for a location report.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationReportDraft {
    /// Report identifier.
    pub id: LocationReportId,
    /// Reporting guard.
    pub guard_id: GuardId,
    /// Reported position.
    pub position: Coordinate,
    /// Ground speed in meters per second, when the handset supplies it.
    pub speed: Option<f64>,
    /// Heading in degrees clockwise from north, when supplied.
    pub direction: Option<f64>,
    /// Instant the fix was captured.
    pub captured_at: DateTime<Utc>,
}

/// An immutable GPS fix. Reports form an append-only stream per guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    id: LocationReportId,
    guard_id: GuardId,
    position: Coordinate,
    speed: Option<f64>,
    direction: Option<f64>,
    captured_at: DateTime<Utc>,
}

impl LocationReport {
    /// Validate a draft into a report.
    pub fn new(draft: LocationReportDraft) -> Result<Self, LocationReportValidationError> {
        if let Some(value) = draft.speed.filter(|v| !v.is_finite() || *v < 0.0) {
            return Err(LocationReportValidationError::InvalidSpeed { value });
        }
        if let Some(value) = draft
            .direction
            .filter(|v| !v.is_finite() || !(0.0..360.0).contains(v))
        {
            return Err(LocationReportValidationError::InvalidDirection { value });
        }

        Ok(Self {
            id: draft.id,
            guard_id: draft.guard_id,
            position: draft.position,
            speed: draft.speed,
            direction: draft.direction,
            captured_at: draft.captured_at,
        })
    }

    /// Report identifier.
    pub fn id(&self) -> LocationReportId {
        self.id
    }

    /// Reporting guard.
    pub fn guard_id(&self) -> GuardId {
        self.guard_id
    }

    /// Reported position.
    pub fn position(&self) -> &Coordinate {
        &self.position
    }

    /// Ground speed in meters per second.
    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    /// Heading in degrees.
    pub fn direction(&self) -> Option<f64> {
        self.direction
    }

    /// Capture instant.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft() -> LocationReportDraft {
        LocationReportDraft {
            id: LocationReportId::random(),
            guard_id: GuardId::random(),
            position: Coordinate::new(12.0, 77.0).expect("valid position"),
            speed: Some(1.2),
            direction: Some(90.0),
            captured_at: Utc::now(),
        }
    }

    #[rstest]
    fn accepts_optional_motion_fields() {
        let report = LocationReport::new(LocationReportDraft {
            speed: None,
            direction: None,
            ..draft()
        })
        .expect("valid report");
        assert!(report.speed().is_none());
    }

    #[rstest]
    #[case(Some(-1.0), None)]
    #[case(Some(f64::NAN), None)]
    #[case(None, Some(360.0))]
    #[case(None, Some(-0.5))]
    fn rejects_invalid_motion(#[case] speed: Option<f64>, #[case] direction: Option<f64>) {
        let result = LocationReport::new(LocationReportDraft {
            speed,
            direction,
            ..draft()
        });
        assert!(result.is_err());
    }
}
