//! Attendance check-in and check-out.
//!
//! The pure transitions in [`crate::domain::attendance`] decide what the next
//! record looks like; storage then applies it with a conditional write so a
//! racing duplicate loses cleanly. Late and early alerts are emitted after the
//! write and never fail it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::attendance::{self, AttendanceEvent};
use crate::domain::field_ops_errors::{
    map_attendance_error, map_coordinate_error, map_read_model_error, map_transition_error,
};
use crate::domain::ports::{
    AttendanceAction, AttendanceCommand, AttendanceRepository, FieldOpsReadModel,
    RecordAttendanceRequest,
};
use crate::domain::{
    AlertEmitter, Attendance, AttendanceError, AttendanceId, AttendancePolicy, Coordinate, Error,
    FieldOpsContext, GuardId, NewAlert, Shift,
};

/// Attendance service implementing the attendance driving port.
#[derive(Clone)]
pub struct AttendanceCommandService<A, M> {
    attendance: Arc<A>,
    read_model: Arc<M>,
    emitter: AlertEmitter,
    policy: AttendancePolicy,
}

impl<A, M> AttendanceCommandService<A, M> {
    /// Create a service over the attendance store and scheduling read model.
    pub fn new(
        attendance: Arc<A>,
        read_model: Arc<M>,
        emitter: AlertEmitter,
        policy: AttendancePolicy,
    ) -> Self {
        Self {
            attendance,
            read_model,
            emitter,
            policy,
        }
    }
}

impl<A, M> AttendanceCommandService<A, M>
where
    A: AttendanceRepository,
    M: FieldOpsReadModel,
{
    async fn check_in(
        &self,
        ctx: &FieldOpsContext,
        shift: &Shift,
        event: AttendanceEvent,
    ) -> Result<Attendance, Error> {
        let current = self
            .attendance
            .find_for_shift(&shift.guard_id, &shift.id)
            .await
            .map_err(map_attendance_error)?;
        let outcome = attendance::check_in(current.as_ref(), AttendanceId::random(), shift, event)
            .map_err(map_transition_error)?;

        let stored = self
            .attendance
            .upsert_check_in(&outcome.attendance)
            .await
            .map_err(map_attendance_error)?
            .ok_or_else(|| map_transition_error(AttendanceError::AlreadyCheckedIn))?;
        info!(
            guard_id = %shift.guard_id,
            shift_id = %shift.id,
            status = %stored.status,
            late_minutes = outcome.late_minutes,
            "guard checked in"
        );

        if self.policy.should_alert_late(outcome.late_minutes) {
            let name = self.guard_name(&shift.guard_id).await;
            self.raise(
                ctx,
                NewAlert::late_arrival(shift.guard_id, &name, outcome.late_minutes),
            )
            .await;
        }
        Ok(stored)
    }

    async fn check_out(
        &self,
        ctx: &FieldOpsContext,
        shift: &Shift,
        event: AttendanceEvent,
    ) -> Result<Attendance, Error> {
        let current = self
            .attendance
            .find_for_shift(&shift.guard_id, &shift.id)
            .await
            .map_err(map_attendance_error)?;
        let outcome =
            attendance::check_out(current.as_ref(), shift, event).map_err(map_transition_error)?;

        let Some(stored) = self
            .attendance
            .record_check_out(&outcome.attendance)
            .await
            .map_err(map_attendance_error)?
        else {
            return Err(self.classify_lost_check_out(shift, event).await);
        };
        info!(
            guard_id = %shift.guard_id,
            shift_id = %shift.id,
            early_minutes = outcome.early_minutes,
            "guard checked out"
        );

        if self.policy.should_alert_early(outcome.early_minutes) {
            let name = self.guard_name(&shift.guard_id).await;
            self.raise(
                ctx,
                NewAlert::early_departure(shift.guard_id, &name, outcome.early_minutes),
            )
            .await;
        }
        Ok(stored)
    }

    /// A conditional check-out matched no row: somebody else moved the record
    /// between our read and write. Re-read to report why.
    async fn classify_lost_check_out(&self, shift: &Shift, event: AttendanceEvent) -> Error {
        let latest = match self
            .attendance
            .find_for_shift(&shift.guard_id, &shift.id)
            .await
        {
            Ok(latest) => latest,
            Err(error) => return map_attendance_error(error),
        };
        let reason = attendance::check_out(latest.as_ref(), shift, event)
            .err()
            .unwrap_or(AttendanceError::AlreadyCheckedOut);
        map_transition_error(reason)
    }

    async fn guard_name(&self, guard_id: &GuardId) -> String {
        match self.read_model.find_guard(guard_id).await {
            Ok(Some(profile)) => profile.display_name,
            Ok(None) => guard_id.to_string(),
            Err(error) => {
                warn!(%guard_id, %error, "guard lookup failed; naming guard by id");
                guard_id.to_string()
            }
        }
    }

    async fn raise(&self, ctx: &FieldOpsContext, alert: NewAlert) {
        let guard_id = alert.guard_id;
        let alert_type = alert.alert_type;
        if let Err(error) = self.emitter.emit(ctx, alert).await {
            warn!(%guard_id, %alert_type, %error, "attendance alert emission failed");
        }
    }
}

#[async_trait]
impl<A, M> AttendanceCommand for AttendanceCommandService<A, M>
where
    A: AttendanceRepository,
    M: FieldOpsReadModel,
{
    async fn record_attendance(
        &self,
        ctx: FieldOpsContext,
        request: RecordAttendanceRequest,
    ) -> Result<Attendance, Error> {
        let position =
            Coordinate::new(request.latitude, request.longitude).map_err(map_coordinate_error)?;
        let shift = self
            .read_model
            .find_shift(&request.shift_id)
            .await
            .map_err(map_read_model_error)?
            .filter(|shift| shift.guard_id == request.guard_id)
            .ok_or_else(|| Error::not_found(format!("shift {} not found", request.shift_id)))?;

        let event = AttendanceEvent {
            at: self.emitter.now(),
            position,
        };
        match request.action {
            AttendanceAction::CheckIn => self.check_in(&ctx, &shift, event).await,
            AttendanceAction::CheckOut => self.check_out(&ctx, &shift, event).await,
        }
    }
}

#[cfg(test)]
#[path = "attendance_service_tests.rs"]
mod tests;
