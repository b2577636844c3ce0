//! Attendance HTTP handler.
//!
//! ```text
//! POST /api/v1/attendance
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{AttendanceAction, RecordAttendanceRequest};
use crate::domain::{Attendance, Coordinate, Error, GuardId, ShiftId, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, require, unsupported_value_error};

/// Request payload for a check-in or check-out.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordAttendanceRequestBody {
    /// `check-in` or `check-out`.
    #[serde(rename = "type")]
    #[schema(example = "check-in")]
    pub action: Option<String>,
    #[schema(format = "uuid")]
    pub guard_id: Option<String>,
    #[schema(format = "uuid")]
    pub shift_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Must match the session user when present.
    #[schema(format = "uuid")]
    pub user_id: Option<String>,
}

/// Attendance record after the transition.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponseBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub guard_id: String,
    #[schema(format = "uuid")]
    pub shift_id: String,
    #[schema(format = "date-time")]
    pub check_in_time: Option<String>,
    pub check_in_lat: Option<f64>,
    pub check_in_lng: Option<f64>,
    #[schema(format = "date-time")]
    pub check_out_time: Option<String>,
    pub check_out_lat: Option<f64>,
    pub check_out_lng: Option<f64>,
    /// `present`, `late` or `absent`.
    pub status: String,
}

impl From<Attendance> for AttendanceResponseBody {
    fn from(record: Attendance) -> Self {
        let lat = |position: Option<Coordinate>| position.map(|p| p.latitude());
        let lng = |position: Option<Coordinate>| position.map(|p| p.longitude());
        Self {
            id: record.id.to_string(),
            guard_id: record.guard_id.to_string(),
            shift_id: record.shift_id.to_string(),
            check_in_time: record.check_in_time.map(|t| t.to_rfc3339()),
            check_in_lat: lat(record.check_in_position),
            check_in_lng: lng(record.check_in_position),
            check_out_time: record.check_out_time.map(|t| t.to_rfc3339()),
            check_out_lat: lat(record.check_out_position),
            check_out_lng: lng(record.check_out_position),
            status: record.status.to_string(),
        }
    }
}

fn parse_action(raw: Option<String>) -> Result<AttendanceAction, Error> {
    let field = FieldName::new("type");
    let raw = require(raw, field)?;
    match raw.as_str() {
        "check-in" => Ok(AttendanceAction::CheckIn),
        "check-out" => Ok(AttendanceAction::CheckOut),
        other => Err(unsupported_value_error(field, other, "check-in, check-out")),
    }
}

fn parse_attendance_request(
    body: RecordAttendanceRequestBody,
) -> Result<(Option<UserId>, RecordAttendanceRequest), Error> {
    let claimed_user = body
        .user_id
        .map(|raw| parse_id(Some(raw), FieldName::new("userId"), UserId::new))
        .transpose()?;
    let request = RecordAttendanceRequest {
        action: parse_action(body.action)?,
        guard_id: parse_id(body.guard_id, FieldName::new("guardId"), GuardId::new)?,
        shift_id: parse_id(body.shift_id, FieldName::new("shiftId"), ShiftId::new)?,
        latitude: require(body.latitude, FieldName::new("latitude"))?,
        longitude: require(body.longitude, FieldName::new("longitude"))?,
    };
    Ok((claimed_user, request))
}

/// Check a guard in to or out of a shift.
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = RecordAttendanceRequestBody,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceResponseBody),
        (status = 400, description = "Invalid request or transition not allowed; see details.code", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "userId does not match the session", body = ErrorSchema),
        (status = 404, description = "Shift not found", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["field-operations"],
    operation_id = "recordAttendance",
    security(("SessionCookie" = []))
)]
#[post("/attendance")]
pub async fn record_attendance(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RecordAttendanceRequestBody>,
) -> ApiResult<web::Json<AttendanceResponseBody>> {
    let (claimed_user, request) = parse_attendance_request(payload.into_inner())?;
    let ctx = session.field_ops_context(claimed_user)?;
    let attendance = state.attendance.record_attendance(ctx, request).await?;
    Ok(web::Json(AttendanceResponseBody::from(attendance)))
}

#[cfg(test)]
#[path = "attendance_tests.rs"]
mod tests;
