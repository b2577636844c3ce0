//! Port for the shift, geofence and guard records owned by scheduling.
//!
//! The field operations core only reads these; creating and editing them is
//! somebody else's job.

use async_trait::async_trait;

use crate::domain::{Geofence, GuardId, GuardProfile, PostId, Shift, ShiftId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by read model adapters.
    pub enum FieldOpsReadModelError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "field operations read model connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "field operations read model query failed: {message}",
    }
}

/// Read-only access to scheduling data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FieldOpsReadModel: Send + Sync {
    /// The guard's shift with status `in_progress`, if any.
    async fn find_in_progress_shift(
        &self,
        guard_id: &GuardId,
    ) -> Result<Option<Shift>, FieldOpsReadModelError>;

    /// A shift by id.
    async fn find_shift(&self, shift_id: &ShiftId)
    -> Result<Option<Shift>, FieldOpsReadModelError>;

    /// Every geofence attached to a post, active or not.
    async fn list_post_geofences(
        &self,
        post_id: &PostId,
    ) -> Result<Vec<Geofence>, FieldOpsReadModelError>;

    /// Display details of a guard.
    async fn find_guard(
        &self,
        guard_id: &GuardId,
    ) -> Result<Option<GuardProfile>, FieldOpsReadModelError>;
}

/// Fixture implementation with no shifts, geofences or guards.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFieldOpsReadModel;

#[async_trait]
impl FieldOpsReadModel for FixtureFieldOpsReadModel {
    async fn find_in_progress_shift(
        &self,
        _guard_id: &GuardId,
    ) -> Result<Option<Shift>, FieldOpsReadModelError> {
        Ok(None)
    }

    async fn find_shift(
        &self,
        _shift_id: &ShiftId,
    ) -> Result<Option<Shift>, FieldOpsReadModelError> {
        Ok(None)
    }

    async fn list_post_geofences(
        &self,
        _post_id: &PostId,
    ) -> Result<Vec<Geofence>, FieldOpsReadModelError> {
        Ok(Vec::new())
    }

    async fn find_guard(
        &self,
        _guard_id: &GuardId,
    ) -> Result<Option<GuardProfile>, FieldOpsReadModelError> {
        Ok(None)
    }
}
