//! Row conversion tests.

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::{
    AlertId, AlertSeverity, AlertStatus, AlertType, AttendanceStatus, GeofenceEventKind,
    GeofenceId, GuardId, LocationReportId, NewAlert, ShiftStatus,
};

#[fixture]
fn geofence_row() -> GeofenceRow {
    GeofenceRow {
        id: Uuid::new_v4(),
        post_id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        name: "Dock gate".to_owned(),
        center_lat: 12.9716,
        center_lng: 77.5946,
        radius_meters: 100.0,
        alert_types: vec!["exit".to_owned(), "entry".to_owned()],
        active_schedule: json!({
            "enabled": true,
            "window": { "start": "22:00:00", "end": "06:00:00" },
            "weekdays": ["Mon", "Tue"]
        }),
        is_active: true,
    }
}

#[fixture]
fn attendance_row() -> AttendanceRow {
    AttendanceRow {
        id: Uuid::new_v4(),
        guard_id: Uuid::new_v4(),
        shift_id: Uuid::new_v4(),
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
fn geofence_row_decodes_kinds_and_schedule(geofence_row: GeofenceRow) {
    let geofence = Geofence::try_from(geofence_row).expect("valid row");
    assert!(geofence.reports(GeofenceEventKind::Exit));
    assert!(geofence.reports(GeofenceEventKind::Entry));
    assert!(geofence.active_schedule.enabled);
    assert_eq!(geofence.active_schedule.weekdays.len(), 2);
}

#[rstest]
fn unknown_alert_kind_is_rejected(mut geofence_row: GeofenceRow) {
    geofence_row.alert_types = vec!["loiter".to_owned()];
    let err = Geofence::try_from(geofence_row).expect_err("unknown kind");
    assert!(err.to_string().starts_with("invalid geofences.alert_types"));
}

#[rstest]
#[case(0.0)]
#[case(-5.0)]
#[case(f64::NAN)]
fn non_positive_radius_is_rejected(mut geofence_row: GeofenceRow, #[case] radius: f64) {
    geofence_row.radius_meters = radius;
    assert!(Geofence::try_from(geofence_row).is_err());
}

#[rstest]
fn attendance_row_survives_a_domain_round_trip(attendance_row: AttendanceRow) {
    let record = Attendance::try_from(attendance_row.clone()).expect("valid row");
    assert_eq!(record.status, AttendanceStatus::Late);
    assert!(record.check_out_position.is_none());

    let back = AttendanceRow::from(&record);
    assert_eq!(back.check_in_lat, attendance_row.check_in_lat);
    assert_eq!(back.status, "late");
}

#[rstest]
fn half_a_coordinate_is_rejected(mut attendance_row: AttendanceRow) {
    attendance_row.check_in_lng = None;
    let err = Attendance::try_from(attendance_row).expect_err("half pair");
    assert!(err.to_string().contains("half a coordinate pair"));
}

#[rstest]
fn shift_status_is_parsed() {
    let start = Utc
        .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid start");
    let row = ShiftRow {
        id: Uuid::new_v4(),
        guard_id: Uuid::new_v4(),
        post_id: Uuid::new_v4(),
        start_time: start,
        end_time: start + chrono::Duration::hours(8),
        status: "in_progress".to_owned(),
    };
    let shift = Shift::try_from(row).expect("valid row");
    assert_eq!(shift.status, ShiftStatus::InProgress);
}

#[rstest]
fn alert_row_maps_the_type_column() {
    let row = AlertRow {
        id: Uuid::new_v4(),
        alert_type: "geofence_breach".to_owned(),
        severity: "high".to_owned(),
        guard_id: Uuid::new_v4(),
        geofence_id: Some(Uuid::new_v4()),
        location_id: None,
        message: "Guard has left the designated area: Dock gate".to_owned(),
        status: "active".to_owned(),
        created_at: Utc::now(),
        resolved_at: None,
        opens_episode: true,
    };
    let alert = Alert::try_from(row.clone()).expect("valid row");
    assert_eq!(alert.alert_type, AlertType::GeofenceBreach);
    assert_eq!(alert.severity, AlertSeverity::High);
    assert_eq!(alert.status, AlertStatus::Active);
    assert_eq!(AlertRow::from(&alert).alert_type, row.alert_type);
}

#[rstest]
fn only_episode_rows_claim_the_open_episode_slot() {
    let alert = NewAlert::geofence_breach(
        GuardId::random(),
        GeofenceId::random(),
        "Dock gate",
        LocationReportId::random(),
    )
    .into_alert(AlertId::random(), Utc::now());

    let plain = AlertRow::from(&alert);
    let opening = AlertRow::opening_episode(&alert);
    assert!(!plain.opens_episode);
    assert!(opening.opens_episode);
    assert_eq!(opening.id, plain.id);
    assert_eq!(opening.status, "active");
}
