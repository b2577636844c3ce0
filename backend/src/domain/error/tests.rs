//! Tests for the domain error payload.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("bad")
}

#[rstest]
fn invalid_request_constructor_sets_code(base_error: Error) {
    assert_eq!(base_error.code(), ErrorCode::InvalidRequest);
    assert_eq!(base_error.message(), "bad");
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values(base_error: Error) {
    let result = base_error.try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("fixture is a valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::conflict("taken") }).await;

    assert_eq!(error.trace_id(), Some(TRACE_ID));
}

#[rstest]
#[case(ErrorCode::ServiceUnavailable, true)]
#[case(ErrorCode::InternalError, false)]
#[case(ErrorCode::Conflict, false)]
#[case(ErrorCode::InvalidRequest, false)]
#[case(ErrorCode::NotFound, false)]
fn only_unavailability_is_transient(#[case] code: ErrorCode, #[case] expected: bool) {
    assert_eq!(code.is_transient(), expected);
}

#[rstest]
fn serializes_camel_case_payload() {
    let error = Error::conflict("already checked in")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "code": "already_checked_in" }));

    let value = serde_json::to_value(&error).expect("error serializes");
    assert_eq!(
        value,
        json!({
            "code": "conflict",
            "message": "already checked in",
            "traceId": TRACE_ID,
            "details": { "code": "already_checked_in" },
        })
    );
}

#[rstest]
fn deserialization_rejects_blank_messages() {
    let result: Result<Error, _> =
        serde_json::from_value(json!({ "code": "not_found", "message": "  " }));
    assert!(result.is_err());
}
