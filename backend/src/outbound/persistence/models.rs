//! Diesel row structs and their conversions to domain types.
//!
//! Rows stay private to the persistence layer. Conversions out of the
//! database re-validate through the domain constructors, so a row that
//! violates a domain invariant surfaces as a decode error rather than a
//! silently wrong value.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{alerts, attendance, geofences, guards, location_reports, shifts};
use crate::domain::{
    ActiveSchedule, Alert, Attendance, Coordinate, Geofence, GeofenceEventKind, GuardProfile,
    LocationReport, Shift,
};

/// Row conversion failure: a stored value the domain rejects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {column}: {message}")]
pub(crate) struct RowDecodeError {
    column: &'static str,
    message: String,
}

impl RowDecodeError {
    fn new(column: &'static str, message: impl ToString) -> Self {
        Self {
            column,
            message: message.to_string(),
        }
    }
}

fn coordinate(
    column: &'static str,
    latitude: f64,
    longitude: f64,
) -> Result<Coordinate, RowDecodeError> {
    Coordinate::new(latitude, longitude).map_err(|err| RowDecodeError::new(column, err))
}

fn optional_coordinate(
    column: &'static str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<Coordinate>, RowDecodeError> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => coordinate(column, lat, lng).map(Some),
        (None, None) => Ok(None),
        _ => Err(RowDecodeError::new(column, "half a coordinate pair")),
    }
}

/// Guard lookup row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = guards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GuardRow {
    pub id: Uuid,
    pub display_name: String,
}

impl From<GuardRow> for GuardProfile {
    fn from(row: GuardRow) -> Self {
        Self {
            id: row.id.into(),
            display_name: row.display_name,
        }
    }
}

/// Shift row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shifts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShiftRow {
    pub id: Uuid,
    pub guard_id: Uuid,
    pub post_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = RowDecodeError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            guard_id: row.guard_id.into(),
            post_id: row.post_id.into(),
            start_time: row.start_time,
            end_time: row.end_time,
            status: row
                .status
                .parse()
                .map_err(|err| RowDecodeError::new("shifts.status", err))?,
        })
    }
}

/// Geofence row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = geofences)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GeofenceRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_meters: f64,
    pub alert_types: Vec<String>,
    pub active_schedule: serde_json::Value,
    pub is_active: bool,
}

impl TryFrom<GeofenceRow> for Geofence {
    type Error = RowDecodeError;

    fn try_from(row: GeofenceRow) -> Result<Self, Self::Error> {
        if !(row.radius_meters.is_finite() && row.radius_meters > 0.0) {
            return Err(RowDecodeError::new(
                "geofences.radius_meters",
                format!("{} is not a positive radius", row.radius_meters),
            ));
        }
        let alert_types = row
            .alert_types
            .iter()
            .map(|kind| kind.parse::<GeofenceEventKind>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|err| RowDecodeError::new("geofences.alert_types", err))?;
        let active_schedule: ActiveSchedule = serde_json::from_value(row.active_schedule)
            .map_err(|err| RowDecodeError::new("geofences.active_schedule", err))?;
        Ok(Self {
            id: row.id.into(),
            post_id: row.post_id.into(),
            tenant_id: row.tenant_id.into(),
            name: row.name,
            center: coordinate("geofences.center", row.center_lat, row.center_lng)?,
            radius_meters: row.radius_meters,
            alert_types,
            active_schedule,
            is_active: row.is_active,
        })
    }
}

/// Insertable location report.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = location_reports)]
pub(crate) struct NewLocationReportRow {
    pub id: Uuid,
    pub guard_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub direction: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl From<&LocationReport> for NewLocationReportRow {
    fn from(report: &LocationReport) -> Self {
        Self {
            id: *report.id().as_uuid(),
            guard_id: *report.guard_id().as_uuid(),
            latitude: report.position().latitude(),
            longitude: report.position().longitude(),
            speed: report.speed(),
            direction: report.direction(),
            captured_at: report.captured_at(),
        }
    }
}

/// Attendance row, used for reads and for the check-in upsert.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable)]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AttendanceRow {
    pub id: Uuid,
    pub guard_id: Uuid,
    pub shift_id: Uuid,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_in_lat: Option<f64>,
    pub check_in_lng: Option<f64>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub check_out_lat: Option<f64>,
    pub check_out_lng: Option<f64>,
    pub status: String,
}

impl From<&Attendance> for AttendanceRow {
    fn from(record: &Attendance) -> Self {
        Self {
            id: *record.id.as_uuid(),
            guard_id: *record.guard_id.as_uuid(),
            shift_id: *record.shift_id.as_uuid(),
            check_in_time: record.check_in_time,
            check_in_lat: record.check_in_position.map(|p| p.latitude()),
            check_in_lng: record.check_in_position.map(|p| p.longitude()),
            check_out_time: record.check_out_time,
            check_out_lat: record.check_out_position.map(|p| p.latitude()),
            check_out_lng: record.check_out_position.map(|p| p.longitude()),
            status: record.status.as_str().to_owned(),
        }
    }
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = RowDecodeError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            guard_id: row.guard_id.into(),
            shift_id: row.shift_id.into(),
            check_in_time: row.check_in_time,
            check_in_position: optional_coordinate(
                "attendance.check_in",
                row.check_in_lat,
                row.check_in_lng,
            )?,
            check_out_time: row.check_out_time,
            check_out_position: optional_coordinate(
                "attendance.check_out",
                row.check_out_lat,
                row.check_out_lng,
            )?,
            status: row
                .status
                .parse()
                .map_err(|err| RowDecodeError::new("attendance.status", err))?,
        })
    }
}

/// Alert row, used for inserts and reads.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = alerts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AlertRow {
    pub id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub guard_id: Uuid,
    pub geofence_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub opens_episode: bool,
}

impl AlertRow {
    /// Row for the alert that opens a breach episode. At most one such row
    /// per guard and geofence may be active.
    pub(crate) fn opening_episode(alert: &Alert) -> Self {
        Self {
            opens_episode: true,
            ..Self::from(alert)
        }
    }
}

impl From<&Alert> for AlertRow {
    fn from(alert: &Alert) -> Self {
        Self {
            id: *alert.id.as_uuid(),
            alert_type: alert.alert_type.as_str().to_owned(),
            severity: alert.severity.as_str().to_owned(),
            guard_id: *alert.guard_id.as_uuid(),
            geofence_id: alert.geofence_id.map(|id| *id.as_uuid()),
            location_id: alert.location_id.map(|id| *id.as_uuid()),
            message: alert.message.clone(),
            status: alert.status.as_str().to_owned(),
            created_at: alert.created_at,
            resolved_at: alert.resolved_at,
            opens_episode: false,
        }
    }
}

impl TryFrom<AlertRow> for Alert {
    type Error = RowDecodeError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            alert_type: row
                .alert_type
                .parse()
                .map_err(|err| RowDecodeError::new("alerts.type", err))?,
            severity: row
                .severity
                .parse()
                .map_err(|err| RowDecodeError::new("alerts.severity", err))?,
            guard_id: row.guard_id.into(),
            geofence_id: row.geofence_id.map(Into::into),
            location_id: row.location_id.map(Into::into),
            message: row.message,
            status: row
                .status
                .parse()
                .map_err(|err| RowDecodeError::new("alerts.status", err))?,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
