//! Breach detection over post geofences.
//!
//! The detector itself is pure: given a stored report, the guard's
//! in-progress shift and that post's geofences it measures each monitored
//! geofence. Turning a measurement into an alert depends on whether a breach
//! episode is already open for the (guard, geofence) pair, which
//! [`BreachAlertMode::decide`] resolves once the caller has looked that up.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Geofence, GeofenceEventKind, LocationReport, Shift};

/// How repeated outside reports are turned into alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachAlertMode {
    /// One alert when a guard leaves a geofence; the episode stays open,
    /// suppressing further alerts, until the guard is back inside.
    #[default]
    Episode,
    /// One alert for every report outside a geofence.
    PerReport,
}

impl BreachAlertMode {
    /// Stable configuration representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Episode => "episode",
            Self::PerReport => "per_report",
        }
    }

    /// Whether deciding needs to know about an open episode.
    pub fn tracks_episodes(self) -> bool {
        matches!(self, Self::Episode)
    }

    /// Decide what to do with one measurement.
    ///
    /// `episode_open` is ignored in [`BreachAlertMode::PerReport`] mode.
    ///
    /// # Examples
    /// ```
    /// use guardpost_backend::domain::{BreachAlertMode, BreachDecision};
    ///
    /// let mode = BreachAlertMode::Episode;
    /// assert_eq!(mode.decide(true, false, false), BreachDecision::RaiseBreach);
    /// assert_eq!(mode.decide(true, true, false), BreachDecision::Suppress);
    /// assert_eq!(
    ///     mode.decide(false, true, true),
    ///     BreachDecision::CloseEpisode { raise_return: true }
    /// );
    /// ```
    pub fn decide(self, outside: bool, episode_open: bool, reports_entry: bool) -> BreachDecision {
        match (self, outside, episode_open) {
            (Self::PerReport, true, _) | (Self::Episode, true, false) => BreachDecision::RaiseBreach,
            (Self::Episode, true, true) => BreachDecision::Suppress,
            (Self::Episode, false, true) => BreachDecision::CloseEpisode {
                raise_return: reports_entry,
            },
            (_, false, _) => BreachDecision::Nothing,
        }
    }
}

impl fmt::Display for BreachAlertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`BreachAlertMode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown breach alert mode: {0}")]
pub struct ParseBreachAlertModeError(String);

impl FromStr for BreachAlertMode {
    type Err = ParseBreachAlertModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "episode" => Ok(Self::Episode),
            "per_report" => Ok(Self::PerReport),
            other => Err(ParseBreachAlertModeError(other.to_owned())),
        }
    }
}

/// What a single geofence measurement leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachDecision {
    /// Raise a high-severity `geofence_breach` alert.
    RaiseBreach,
    /// Outside, but an episode is already open.
    Suppress,
    /// Back inside: resolve the open breach alert.
    CloseEpisode {
        /// Also raise a low-severity `geofence_return` alert.
        raise_return: bool,
    },
    /// Inside with nothing open.
    Nothing,
}

/// Distance of one report from one monitored geofence.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceMeasurement {
    /// The geofence measured.
    pub geofence: Geofence,
    /// Distance from the geofence center, in meters.
    pub distance_meters: f64,
}

impl GeofenceMeasurement {
    /// Whether the report lies strictly outside the radius.
    pub fn is_outside(&self) -> bool {
        self.distance_meters > self.geofence.radius_meters
    }

    /// Decide the outcome under `mode`.
    pub fn decide(&self, mode: BreachAlertMode, episode_open: bool) -> BreachDecision {
        mode.decide(
            self.is_outside(),
            episode_open,
            self.geofence.reports(GeofenceEventKind::Entry),
        )
    }
}

/// Measure `report` against every geofence monitored at `at`.
///
/// Returns nothing when there is no in-progress shift, when the shift belongs
/// to another guard, or when no geofence is monitored. Geofences of other
/// posts are skipped.
pub fn measure(
    report: &LocationReport,
    shift: Option<&Shift>,
    geofences: &[Geofence],
    at: DateTime<Utc>,
) -> Vec<GeofenceMeasurement> {
    let Some(shift) = shift.filter(|shift| shift.is_in_progress()) else {
        return Vec::new();
    };
    if shift.guard_id != report.guard_id() {
        return Vec::new();
    }
    geofences
        .iter()
        .filter(|geofence| geofence.post_id == shift.post_id && geofence.is_monitored_at(at))
        .map(|geofence| GeofenceMeasurement {
            distance_meters: geofence.distance_from_center(report.position()),
            geofence: geofence.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::{
        ActiveSchedule, Coordinate, GeofenceId, GuardId, LocationReportDraft, LocationReportId,
        PostId, ShiftId, ShiftStatus, TenantId, distance_meters,
    };
    use chrono::Duration;
    use rstest::{fixture, rstest};

    const CENTER: (f64, f64) = (12.000, 77.000);

    #[fixture]
    fn shift() -> Shift {
        let now = Utc::now();
        Shift {
            id: ShiftId::random(),
            guard_id: GuardId::random(),
            post_id: PostId::random(),
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(7),
            status: ShiftStatus::InProgress,
        }
    }

    fn geofence(post_id: PostId, radius_meters: f64) -> Geofence {
        Geofence {
            id: GeofenceId::random(),
            post_id,
            tenant_id: TenantId::random(),
            name: "Main gate".to_owned(),
            center: Coordinate::new(CENTER.0, CENTER.1).expect("valid center"),
            radius_meters,
            alert_types: BTreeSet::from([GeofenceEventKind::Exit]),
            active_schedule: ActiveSchedule::always(),
            is_active: true,
        }
    }

    fn report(guard_id: GuardId, latitude: f64, longitude: f64) -> LocationReport {
        LocationReport::new(LocationReportDraft {
            id: LocationReportId::random(),
            guard_id,
            position: Coordinate::new(latitude, longitude).expect("valid position"),
            speed: None,
            direction: None,
            captured_at: Utc::now(),
        })
        .expect("valid report")
    }

    #[rstest]
    fn center_never_breaches(shift: Shift) {
        let fences = [geofence(shift.post_id, 50.0)];
        let measured = measure(
            &report(shift.guard_id, CENTER.0, CENTER.1),
            Some(&shift),
            &fences,
            Utc::now(),
        );
        assert_eq!(measured.len(), 1);
        assert!(!measured[0].is_outside());
    }

    #[rstest]
    fn one_meter_past_radius_breaches(shift: Shift) {
        // Place the fix 111.195 m north and size the radius one meter short.
        let distance = distance_meters(CENTER.0, CENTER.1, 12.001, 77.0);
        let fences = [geofence(shift.post_id, distance - 1.0)];
        let measured = measure(
            &report(shift.guard_id, 12.001, 77.0),
            Some(&shift),
            &fences,
            Utc::now(),
        );
        assert!(measured[0].is_outside());
    }

    #[rstest]
    fn boundary_is_inside(shift: Shift) {
        let distance = distance_meters(CENTER.0, CENTER.1, 12.001, 77.0);
        let fences = [geofence(shift.post_id, distance)];
        let measured = measure(
            &report(shift.guard_id, 12.001, 77.0),
            Some(&shift),
            &fences,
            Utc::now(),
        );
        assert!(!measured[0].is_outside());
    }

    #[rstest]
    fn no_shift_means_no_evaluation(shift: Shift) {
        let fences = [geofence(shift.post_id, 50.0)];
        let measured = measure(&report(shift.guard_id, 13.0, 77.0), None, &fences, Utc::now());
        assert!(measured.is_empty());
    }

    #[rstest]
    #[case(ShiftStatus::Scheduled)]
    #[case(ShiftStatus::Completed)]
    fn shift_not_in_progress_means_no_evaluation(mut shift: Shift, #[case] status: ShiftStatus) {
        shift.status = status;
        let fences = [geofence(shift.post_id, 50.0)];
        let measured = measure(
            &report(shift.guard_id, 13.0, 77.0),
            Some(&shift),
            &fences,
            Utc::now(),
        );
        assert!(measured.is_empty());
    }

    #[rstest]
    fn skips_inactive_and_foreign_geofences(shift: Shift) {
        let mut inactive = geofence(shift.post_id, 50.0);
        inactive.is_active = false;
        let foreign = geofence(PostId::random(), 50.0);
        let own = geofence(shift.post_id, 50.0);
        let measured = measure(
            &report(shift.guard_id, 13.0, 77.0),
            Some(&shift),
            &[inactive, foreign, own.clone()],
            Utc::now(),
        );
        assert_eq!(measured.len(), 1);
        assert_eq!(measured[0].geofence.id, own.id);
    }

    #[rstest]
    fn every_breached_geofence_is_measured(shift: Shift) {
        let fences = [geofence(shift.post_id, 50.0), geofence(shift.post_id, 80.0)];
        let measured = measure(
            &report(shift.guard_id, 12.001, 77.0),
            Some(&shift),
            &fences,
            Utc::now(),
        );
        assert_eq!(measured.iter().filter(|m| m.is_outside()).count(), 2);
    }

    #[rstest]
    #[case(BreachAlertMode::Episode, true, false, false, BreachDecision::RaiseBreach)]
    #[case(BreachAlertMode::Episode, true, true, false, BreachDecision::Suppress)]
    #[case(
        BreachAlertMode::Episode,
        false,
        true,
        false,
        BreachDecision::CloseEpisode { raise_return: false }
    )]
    #[case(BreachAlertMode::Episode, false, false, true, BreachDecision::Nothing)]
    #[case(BreachAlertMode::PerReport, true, true, false, BreachDecision::RaiseBreach)]
    #[case(BreachAlertMode::PerReport, false, true, true, BreachDecision::Nothing)]
    fn decides_per_mode(
        #[case] mode: BreachAlertMode,
        #[case] outside: bool,
        #[case] open: bool,
        #[case] reports_entry: bool,
        #[case] expected: BreachDecision,
    ) {
        assert_eq!(mode.decide(outside, open, reports_entry), expected);
    }

    #[rstest]
    #[case("episode", Some(BreachAlertMode::Episode))]
    #[case("per_report", Some(BreachAlertMode::PerReport))]
    #[case("never", None)]
    fn parses_modes(#[case] raw: &str, #[case] expected: Option<BreachAlertMode>) {
        assert_eq!(raw.parse::<BreachAlertMode>().ok(), expected);
    }
}
