//! Mapping from port and validation failures to domain errors.
//!
//! Connection failures become `service_unavailable`, which clients treat as
//! transient and queue for replay. Query failures become `internal`.

use serde_json::json;

use crate::domain::ports::{
    AlertRepositoryError, AttendanceRepositoryError, FieldOpsReadModelError,
    LocationReportRepositoryError,
};
use crate::domain::{
    AttendanceError, CoordinateValidationError, Error, LocationReportValidationError,
};

macro_rules! map_port_error {
    ($fn_name:ident, $error:ident, $label:literal) => {
        pub(crate) fn $fn_name(error: $error) -> Error {
            match error {
                $error::Connection { message } => {
                    Error::service_unavailable(format!(concat!($label, " unavailable: {}"), message))
                }
                $error::Query { message } => {
                    Error::internal(format!(concat!($label, " error: {}"), message))
                }
            }
        }
    };
}

map_port_error!(map_report_error, LocationReportRepositoryError, "location report repository");
map_port_error!(map_read_model_error, FieldOpsReadModelError, "field operations read model");
map_port_error!(map_attendance_error, AttendanceRepositoryError, "attendance repository");
map_port_error!(map_alert_error, AlertRepositoryError, "alert repository");

fn invalid_field(field: &str, code: &str, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

pub(crate) fn map_coordinate_error(error: CoordinateValidationError) -> Error {
    let field = match error {
        CoordinateValidationError::InvalidLatitude { .. } => "latitude",
        CoordinateValidationError::InvalidLongitude { .. } => "longitude",
    };
    invalid_field(field, "out_of_range", error.to_string())
}

pub(crate) fn map_report_validation_error(error: LocationReportValidationError) -> Error {
    let field = match error {
        LocationReportValidationError::InvalidSpeed { .. } => "speed",
        LocationReportValidationError::InvalidDirection { .. } => "direction",
    };
    invalid_field(field, "out_of_range", error.to_string())
}

/// Rejected attendance transitions are invalid requests for the current
/// state; `details.code` names the reason.
pub(crate) fn map_transition_error(error: AttendanceError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "code": error.code() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    fn connection_failures_are_transient() {
        let error = map_attendance_error(AttendanceRepositoryError::connection("refused"));
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
        assert!(error.code().is_transient());
    }

    #[rstest]
    fn query_failures_are_internal() {
        let error = map_report_error(LocationReportRepositoryError::query("syntax"));
        assert_eq!(error.code(), ErrorCode::InternalError);
    }

    #[rstest]
    #[case(AttendanceError::AlreadyCheckedIn, "already_checked_in")]
    #[case(AttendanceError::NotCheckedIn, "not_checked_in")]
    #[case(AttendanceError::AlreadyCheckedOut, "already_checked_out")]
    #[case(AttendanceError::CheckOutBeforeCheckIn, "check_out_before_check_in")]
    fn transitions_are_invalid_requests_with_their_code(
        #[case] error: AttendanceError,
        #[case] code: &str,
    ) {
        let mapped = map_transition_error(error);
        assert_eq!(mapped.code(), ErrorCode::InvalidRequest);
        assert!(!mapped.code().is_transient());
        assert_eq!(
            mapped.details().and_then(|d| d.get("code")).and_then(|c| c.as_str()),
            Some(code)
        );
    }

    #[rstest]
    fn coordinate_errors_name_the_field() {
        let mapped = map_coordinate_error(CoordinateValidationError::InvalidLongitude {
            value: 200.0,
        });
        assert_eq!(mapped.code(), ErrorCode::InvalidRequest);
        assert_eq!(mapped.details().and_then(|d| d.get("field")), Some(&json!("longitude")));
    }
}
