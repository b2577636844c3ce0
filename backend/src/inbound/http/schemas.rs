//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay free of `ToSchema`. The wrappers here mirror their wire
//! shape and register under the domain type's name via `#[schema(as = ...)]`.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The transition is not allowed from the current state.
    #[schema(rename = "conflict")]
    Conflict,
    /// Storage is unreachable; the client may queue and retry.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "guard is already checked in for this shift")]
    message: String,
    /// Correlation identifier matching the `Trace-Id` response header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary details, e.g. `{"code": "already_checked_in"}`.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::AlertEvent`], the payload pushed on
/// `/ws/alerts`.
#[derive(ToSchema)]
#[schema(as = crate::domain::AlertEvent, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AlertEventSchema {
    #[schema(format = "uuid")]
    id: String,
    /// `geofence_breach`, `geofence_return`, `late_arrival` or `early_departure`.
    #[schema(rename = "type", example = "geofence_breach")]
    alert_type: String,
    #[schema(example = "Guard has left the designated area: Warehouse 7")]
    message: String,
    /// `low`, `medium` or `high`.
    #[schema(example = "high")]
    severity: String,
    #[schema(format = "uuid")]
    guard_id: String,
    #[schema(format = "date-time")]
    created_at: String,
}
