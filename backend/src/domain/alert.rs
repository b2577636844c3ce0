//! Alerts raised by breach detection and attendance timing.
//!
//! Alerts are append-only. Resolving one is a status transition recorded on
//! the same row; nothing in the field operations core deletes an alert.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AlertId, GeofenceId, GuardId, LocationReportId};

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $error:ident, $label:literal {
            $($(#[$variant_meta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl $name {
            /// Stable storage and wire representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        #[doc = concat!("Error returned when parsing an unknown ", $label, ".")]
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        #[error("unknown {}: {value}", $label)]
        pub struct $error {
            value: String,
        }

        impl FromStr for $name {
            type Err = $error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok(Self::$variant),)+
                    other => Err($error { value: other.to_owned() }),
                }
            }
        }
    };
}

string_enum! {
    /// Category of an alert.
    AlertType, ParseAlertTypeError, "alert type" {
        /// A guard left an active geofence.
        GeofenceBreach => "geofence_breach",
        /// A guard came back inside a geofence after a breach.
        GeofenceReturn => "geofence_return",
        /// A guard checked in past the lateness threshold.
        LateArrival => "late_arrival",
        /// A guard checked out before the early-departure threshold.
        EarlyDeparture => "early_departure",
    }
}

string_enum! {
    /// How urgently a dispatcher should react.
    AlertSeverity, ParseAlertSeverityError, "alert severity" {
        /// Informational.
        Low => "low",
        /// Needs attention during the shift.
        Medium => "medium",
        /// Needs immediate attention.
        High => "high",
    }
}

string_enum! {
    /// Alert lifecycle.
    AlertStatus, ParseAlertStatusError, "alert status" {
        /// Open and visible on dashboards.
        Active => "active",
        /// Closed, either by a dispatcher or by the episode ending.
        Resolved => "resolved",
    }
}

/// A persisted alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Alert identifier.
    pub id: AlertId,
    /// Category.
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Urgency.
    pub severity: AlertSeverity,
    /// Guard the alert is about.
    pub guard_id: GuardId,
    /// Geofence involved, for geofence alerts.
    pub geofence_id: Option<GeofenceId>,
    /// Location report that triggered the alert, for geofence alerts.
    pub location_id: Option<LocationReportId>,
    /// Human-readable message.
    pub message: String,
    /// Lifecycle state.
    pub status: AlertStatus,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Resolution instant, once resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Everything needed to raise a new alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    /// Category.
    pub alert_type: AlertType,
    /// Urgency.
    pub severity: AlertSeverity,
    /// Guard the alert is about.
    pub guard_id: GuardId,
    /// Human-readable message.
    pub message: String,
    /// Geofence involved, if any.
    pub geofence_id: Option<GeofenceId>,
    /// Triggering location report, if any.
    pub location_id: Option<LocationReportId>,
}

impl NewAlert {
    /// High-severity alert for a guard leaving `geofence_name`.
    pub fn geofence_breach(
        guard_id: GuardId,
        geofence_id: GeofenceId,
        geofence_name: &str,
        location_id: LocationReportId,
    ) -> Self {
        Self {
            alert_type: AlertType::GeofenceBreach,
            severity: AlertSeverity::High,
            guard_id,
            message: format!("Guard has left the designated area: {geofence_name}"),
            geofence_id: Some(geofence_id),
            location_id: Some(location_id),
        }
    }

    /// Low-severity alert for a guard returning inside `geofence_name`.
    pub fn geofence_return(
        guard_id: GuardId,
        geofence_id: GeofenceId,
        geofence_name: &str,
        location_id: LocationReportId,
    ) -> Self {
        Self {
            alert_type: AlertType::GeofenceReturn,
            severity: AlertSeverity::Low,
            guard_id,
            message: format!("Guard has returned to the designated area: {geofence_name}"),
            geofence_id: Some(geofence_id),
            location_id: Some(location_id),
        }
    }

    /// Medium-severity alert for a late check-in.
    pub fn late_arrival(guard_id: GuardId, guard_name: &str, late_minutes: i64) -> Self {
        Self {
            alert_type: AlertType::LateArrival,
            severity: AlertSeverity::Medium,
            guard_id,
            message: format!("Guard {guard_name} checked in {late_minutes} minutes late"),
            geofence_id: None,
            location_id: None,
        }
    }

    /// Medium-severity alert for an early check-out.
    pub fn early_departure(guard_id: GuardId, guard_name: &str, early_minutes: i64) -> Self {
        Self {
            alert_type: AlertType::EarlyDeparture,
            severity: AlertSeverity::Medium,
            guard_id,
            message: format!("Guard {guard_name} checked out {early_minutes} minutes early"),
            geofence_id: None,
            location_id: None,
        }
    }

    /// Materialise the alert with an identifier and creation instant.
    pub fn into_alert(self, id: AlertId, created_at: DateTime<Utc>) -> Alert {
        Alert {
            id,
            alert_type: self.alert_type,
            severity: self.severity,
            guard_id: self.guard_id,
            geofence_id: self.geofence_id,
            location_id: self.location_id,
            message: self.message,
            status: AlertStatus::Active,
            created_at,
            resolved_at: None,
        }
    }
}
