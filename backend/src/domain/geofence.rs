//! Geofences: circular authorized areas attached to a post.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::{Coordinate, GeofenceId, PostId, TenantId};

/// Boundary crossing a geofence can be configured to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceEventKind {
    /// The guard moved back inside the radius.
    Entry,
    /// The guard moved outside the radius.
    Exit,
}

impl GeofenceEventKind {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }
}

impl fmt::Display for GeofenceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`GeofenceEventKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown geofence event kind: {0}")]
pub struct ParseGeofenceEventKindError(String);

impl FromStr for GeofenceEventKind {
    type Err = ParseGeofenceEventKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "entry" => Ok(Self::Entry),
            "exit" => Ok(Self::Exit),
            other => Err(ParseGeofenceEventKindError(other.to_owned())),
        }
    }
}

/// Daily time window, `[start, end)` in UTC.
///
/// A window whose `start` is later than its `end` wraps past midnight, so
/// `22:00..06:00` covers a night shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// Inclusive start of the window.
    pub start: NaiveTime,
    /// Exclusive end of the window.
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Whether `time` falls inside the window.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// When a geofence is monitored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSchedule {
    /// When `false`, the geofence is monitored around the clock.
    pub enabled: bool,
    /// Daily window; `None` means the whole day.
    pub window: Option<TimeWindow>,
    /// Days on which the geofence is monitored; empty means every day.
    pub weekdays: HashSet<Weekday>,
}

impl ActiveSchedule {
    /// Schedule that never restricts monitoring.
    pub fn always() -> Self {
        Self::default()
    }

    /// Whether the schedule covers `instant`.
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        if !self.enabled {
            return true;
        }
        if !self.weekdays.is_empty() && !self.weekdays.contains(&instant.weekday()) {
            return false;
        }
        self.window
            .is_none_or(|window| window.contains(instant.time()))
    }
}

/// A circular authorized area attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    /// Geofence identifier.
    pub id: GeofenceId,
    /// Post owning the geofence.
    pub post_id: PostId,
    /// Tenant owning the post.
    pub tenant_id: TenantId,
    /// Display name used in alert messages.
    pub name: String,
    /// Center of the authorized circle.
    pub center: Coordinate,
    /// Radius of the authorized circle in meters.
    pub radius_meters: f64,
    /// Crossings the tenant asked to be told about.
    pub alert_types: BTreeSet<GeofenceEventKind>,
    /// Monitoring schedule.
    pub active_schedule: ActiveSchedule,
    /// Whether the geofence is switched on at all.
    pub is_active: bool,
}

impl Geofence {
    /// Whether this geofence should be evaluated at `instant`.
    pub fn is_monitored_at(&self, instant: DateTime<Utc>) -> bool {
        self.is_active && self.active_schedule.covers(instant)
    }

    /// Distance from the geofence center to `position`, in meters.
    pub fn distance_from_center(&self, position: &Coordinate) -> f64 {
        self.center.distance_to(position)
    }

    /// Whether the tenant wants a notification for `kind` crossings.
    pub fn reports(&self, kind: GeofenceEventKind) -> bool {
        self.alert_types.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        // 2026-03-02 is a Monday.
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    #[rstest]
    fn disabled_schedule_always_covers() {
        let schedule = ActiveSchedule {
            enabled: false,
            window: Some(TimeWindow {
                start: time(9, 0),
                end: time(10, 0),
            }),
            weekdays: HashSet::from([Weekday::Sun]),
        };
        assert!(schedule.covers(at(23, 0)));
    }

    #[rstest]
    #[case(8, 59, false)]
    #[case(9, 0, true)]
    #[case(16, 59, true)]
    #[case(17, 0, false)]
    fn day_window_is_half_open(#[case] hour: u32, #[case] minute: u32, #[case] expected: bool) {
        let schedule = ActiveSchedule {
            enabled: true,
            window: Some(TimeWindow {
                start: time(9, 0),
                end: time(17, 0),
            }),
            weekdays: HashSet::new(),
        };
        assert_eq!(schedule.covers(at(hour, minute)), expected);
    }

    #[rstest]
    #[case(23, 30, true)]
    #[case(2, 0, true)]
    #[case(6, 0, false)]
    #[case(12, 0, false)]
    fn overnight_window_wraps_midnight(
        #[case] hour: u32,
        #[case] minute: u32,
        #[case] expected: bool,
    ) {
        let window = TimeWindow {
            start: time(22, 0),
            end: time(6, 0),
        };
        assert_eq!(window.contains(time(hour, minute)), expected);
    }

    #[rstest]
    #[case(Weekday::Mon, true)]
    #[case(Weekday::Tue, false)]
    fn weekday_set_restricts_days(#[case] day: Weekday, #[case] expected: bool) {
        let schedule = ActiveSchedule {
            enabled: true,
            window: None,
            weekdays: HashSet::from([day]),
        };
        assert_eq!(schedule.covers(at(12, 0)), expected);
    }

    #[rstest]
    fn stored_schedule_restricts_by_weekday() {
        let schedule: ActiveSchedule = serde_json::from_value(serde_json::json!({
            "enabled": true,
            "window": { "start": "09:00:00", "end": "17:00:00" },
            "weekdays": ["Mon", "Wed"]
        }))
        .expect("schedule decodes");
        assert!(schedule.weekdays.contains(&Weekday::Wed));
        assert!(schedule.covers(at(12, 0)));
        assert!(!schedule.covers(at(12, 0) + chrono::Duration::days(1)));
    }

    #[rstest]
    fn inactive_geofence_is_never_monitored() {
        let geofence = Geofence {
            id: GeofenceId::random(),
            post_id: PostId::random(),
            tenant_id: TenantId::random(),
            name: "Main gate".to_owned(),
            center: Coordinate::new(12.0, 77.0).expect("valid center"),
            radius_meters: 50.0,
            alert_types: BTreeSet::from([GeofenceEventKind::Exit]),
            active_schedule: ActiveSchedule::always(),
            is_active: false,
        };
        assert!(!geofence.is_monitored_at(at(12, 0)));
    }

    #[rstest]
    #[case("entry", Some(GeofenceEventKind::Entry))]
    #[case("exit", Some(GeofenceEventKind::Exit))]
    #[case("dwell", None)]
    fn parses_event_kinds(#[case] raw: &str, #[case] expected: Option<GeofenceEventKind>) {
        assert_eq!(raw.parse::<GeofenceEventKind>().ok(), expected);
    }
}
