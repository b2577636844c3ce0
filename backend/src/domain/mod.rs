//! Domain primitives, field operations algorithms and services.
//!
//! Purpose: keep the breach detector, the attendance state machine and the
//! alert emitter free of transport and storage concerns. Adapters reach the
//! domain only through [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Geospatial and scheduling types: Coordinate, Geofence, Shift, ...
//! - Pure algorithms: [`distance_meters`], [`breach::measure`],
//!   [`attendance::check_in`], [`attendance::check_out`].
//! - Services implementing the driving ports: [`LocationCommandService`],
//!   [`AttendanceCommandService`].

pub mod alert;
pub mod alert_emitter;
pub mod alert_room;
pub mod attendance;
pub mod attendance_service;
pub mod breach;
pub mod error;
mod field_ops_errors;
pub mod geo;
pub mod geofence;
pub mod ids;
pub mod location;
pub mod location_service;
pub mod ports;
pub mod shift;
pub mod trace_id;

pub use self::alert::{
    Alert, AlertSeverity, AlertStatus, AlertType, NewAlert, ParseAlertSeverityError,
    ParseAlertStatusError, ParseAlertTypeError,
};
pub use self::alert_emitter::AlertEmitter;
pub use self::alert_room::{AlertEvent, AlertRoom, AlertRoomParseError, FieldOpsContext};
pub use self::attendance::{
    Attendance, AttendanceError, AttendanceEvent, AttendancePolicy, AttendanceState,
    AttendanceStatus, CheckInOutcome, CheckOutOutcome, DEFAULT_THRESHOLD_MINUTES,
    ParseAttendanceStatusError, classify_check_in, early_departure_minutes,
};
pub use self::attendance_service::AttendanceCommandService;
pub use self::breach::{
    BreachAlertMode, BreachDecision, GeofenceMeasurement, ParseBreachAlertModeError,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::geo::{Coordinate, CoordinateValidationError, EARTH_RADIUS_METERS, distance_meters};
pub use self::geofence::{
    ActiveSchedule, Geofence, GeofenceEventKind, ParseGeofenceEventKindError, TimeWindow,
};
pub use self::ids::{
    AlertId, AttendanceId, GeofenceId, GuardId, IdValidationError, LocationReportId, PostId,
    ShiftId, TenantId, UserId,
};
pub use self::location::{LocationReport, LocationReportDraft, LocationReportValidationError};
pub use self::location_service::LocationCommandService;
pub use self::shift::{GuardProfile, ParseShiftStatusError, Shift, ShiftStatus};
pub use self::trace_id::TraceId;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use guardpost_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
