//! Test utilities for the backend crate.
//!
//! In-memory adapters for every field operations port, shared by unit tests
//! (in `src/`) and integration tests (in `tests/`). Only compiled for tests or
//! with the `test-support` feature.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use futures_util::stream::{self, BoxStream};
use mockable::Clock;

use crate::domain::ports::{
    AlertBroadcastError, AlertBroadcaster, AlertFeed, AlertRepository, AlertRepositoryError,
    AttendanceRepository, AttendanceRepositoryError, FieldOpsReadModel, FieldOpsReadModelError,
    LocationReportRepository, LocationReportRepositoryError,
};
use crate::domain::{
    Alert, AlertEvent, AlertRoom, AlertStatus, AlertType, Attendance, Geofence,
    GeofenceId, GuardId, GuardProfile, LocationReport, PostId, Shift, ShiftId,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.0) = now;
    }

    /// Move forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        *lock(&self.0) += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

#[derive(Default)]
struct FieldOpsState {
    shifts: HashMap<ShiftId, Shift>,
    geofences: Vec<Geofence>,
    guards: HashMap<GuardId, GuardProfile>,
    reports: Vec<LocationReport>,
    attendance: HashMap<(GuardId, ShiftId), Attendance>,
    alerts: Vec<Alert>,
}

/// In-memory store implementing every field operations repository port.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryFieldOps {
    state: Arc<Mutex<FieldOpsState>>,
}

impl InMemoryFieldOps {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a shift.
    pub fn put_shift(&self, shift: Shift) {
        lock(&self.state).shifts.insert(shift.id, shift);
    }

    /// Add a geofence.
    pub fn put_geofence(&self, geofence: Geofence) {
        lock(&self.state).geofences.push(geofence);
    }

    /// Add or replace a guard profile.
    pub fn put_guard(&self, guard: GuardProfile) {
        lock(&self.state).guards.insert(guard.id, guard);
    }

    /// Every stored report, oldest first.
    pub fn reports(&self) -> Vec<LocationReport> {
        lock(&self.state).reports.clone()
    }

    /// Every stored alert, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        lock(&self.state).alerts.clone()
    }

    /// Stored alerts of one type.
    pub fn alerts_of(&self, alert_type: AlertType) -> Vec<Alert> {
        self.alerts()
            .into_iter()
            .filter(|alert| alert.alert_type == alert_type)
            .collect()
    }

    /// Number of attendance rows.
    pub fn attendance_rows(&self) -> usize {
        lock(&self.state).attendance.len()
    }

    /// Stored attendance for a guard and shift.
    pub fn attendance(&self, guard_id: GuardId, shift_id: ShiftId) -> Option<Attendance> {
        lock(&self.state)
            .attendance
            .get(&(guard_id, shift_id))
            .cloned()
    }
}

#[async_trait]
impl LocationReportRepository for InMemoryFieldOps {
    async fn append(&self, report: &LocationReport) -> Result<(), LocationReportRepositoryError> {
        lock(&self.state).reports.push(report.clone());
        Ok(())
    }
}

#[async_trait]
impl FieldOpsReadModel for InMemoryFieldOps {
    async fn find_in_progress_shift(
        &self,
        guard_id: &GuardId,
    ) -> Result<Option<Shift>, FieldOpsReadModelError> {
        Ok(lock(&self.state)
            .shifts
            .values()
            .find(|shift| shift.guard_id == *guard_id && shift.is_in_progress())
            .cloned())
    }

    async fn find_shift(
        &self,
        shift_id: &ShiftId,
    ) -> Result<Option<Shift>, FieldOpsReadModelError> {
        Ok(lock(&self.state).shifts.get(shift_id).cloned())
    }

    async fn list_post_geofences(
        &self,
        post_id: &PostId,
    ) -> Result<Vec<Geofence>, FieldOpsReadModelError> {
        Ok(lock(&self.state)
            .geofences
            .iter()
            .filter(|geofence| geofence.post_id == *post_id)
            .cloned()
            .collect())
    }

    async fn find_guard(
        &self,
        guard_id: &GuardId,
    ) -> Result<Option<GuardProfile>, FieldOpsReadModelError> {
        Ok(lock(&self.state).guards.get(guard_id).cloned())
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryFieldOps {
    async fn find_for_shift(
        &self,
        guard_id: &GuardId,
        shift_id: &ShiftId,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError> {
        Ok(self.attendance(*guard_id, *shift_id))
    }

    async fn upsert_check_in(
        &self,
        attendance: &Attendance,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError> {
        let mut state = lock(&self.state);
        let key = (attendance.guard_id, attendance.shift_id);
        let stored = match state.attendance.get(&key) {
            Some(existing) if existing.check_in_time.is_some() => return Ok(None),
            Some(existing) => Attendance {
                id: existing.id,
                ..attendance.clone()
            },
            None => attendance.clone(),
        };
        state.attendance.insert(key, stored.clone());
        Ok(Some(stored))
    }

    async fn record_check_out(
        &self,
        attendance: &Attendance,
    ) -> Result<Option<Attendance>, AttendanceRepositoryError> {
        let mut state = lock(&self.state);
        let key = (attendance.guard_id, attendance.shift_id);
        let Some(existing) = state
            .attendance
            .get_mut(&key)
            .filter(|row| row.check_in_time.is_some() && row.check_out_time.is_none())
        else {
            return Ok(None);
        };
        existing.check_out_time = attendance.check_out_time;
        existing.check_out_position = attendance.check_out_position;
        Ok(Some(existing.clone()))
    }
}

#[async_trait]
impl AlertRepository for InMemoryFieldOps {
    async fn create(&self, alert: &Alert) -> Result<(), AlertRepositoryError> {
        lock(&self.state).alerts.push(alert.clone());
        Ok(())
    }

    async fn create_open_episode(&self, alert: &Alert) -> Result<bool, AlertRepositoryError> {
        let mut state = lock(&self.state);
        let already_open = state.alerts.iter().any(|open| {
            open.guard_id == alert.guard_id
                && open.geofence_id == alert.geofence_id
                && open.alert_type == alert.alert_type
                && open.status == AlertStatus::Active
        });
        if already_open {
            return Ok(false);
        }
        state.alerts.push(alert.clone());
        Ok(true)
    }

    async fn find_active(
        &self,
        guard_id: &GuardId,
        geofence_id: &GeofenceId,
        alert_type: AlertType,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        Ok(lock(&self.state)
            .alerts
            .iter()
            .find(|alert| {
                alert.guard_id == *guard_id
                    && alert.geofence_id == Some(*geofence_id)
                    && alert.alert_type == alert_type
                    && alert.status == AlertStatus::Active
            })
            .cloned())
    }

    async fn resolve_active(
        &self,
        guard_id: &GuardId,
        geofence_id: &GeofenceId,
        alert_type: AlertType,
        resolved_at: DateTime<Utc>,
    ) -> Result<usize, AlertRepositoryError> {
        let mut state = lock(&self.state);
        let mut resolved = 0;
        for alert in state.alerts.iter_mut().filter(|alert| {
            alert.guard_id == *guard_id
                && alert.geofence_id == Some(*geofence_id)
                && alert.alert_type == alert_type
                && alert.status == AlertStatus::Active
        }) {
            alert.status = AlertStatus::Resolved;
            alert.resolved_at = Some(resolved_at);
            resolved += 1;
        }
        Ok(resolved)
    }
}

/// Broadcaster that records every publication.
#[derive(Clone, Default)]
pub struct RecordingBroadcaster {
    published: Arc<Mutex<Vec<(AlertRoom, AlertEvent)>>>,
}

impl RecordingBroadcaster {
    /// Everything published so far, in order.
    pub fn published(&self) -> Vec<(AlertRoom, AlertEvent)> {
        lock(&self.published).clone()
    }
}

#[async_trait]
impl AlertBroadcaster for RecordingBroadcaster {
    async fn publish(&self, room: &AlertRoom, event: &AlertEvent) -> Result<(), AlertBroadcastError> {
        lock(&self.published).push((*room, event.clone()));
        Ok(())
    }
}

impl AlertFeed for RecordingBroadcaster {
    fn subscribe(&self, _room: &AlertRoom) -> BoxStream<'static, AlertEvent> {
        Box::pin(stream::empty())
    }
}
