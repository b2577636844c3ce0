//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every failure becomes a 400 whose `details` name the offending field and a
//! stable `code`, so the mobile client can tell a permanently bad request
//! from one worth queueing.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{Error, IdValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    UnsupportedValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::UnsupportedValue => "unsupported_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: String, value: Option<&str>) -> Error {
    let mut details = json!({
        "field": field.as_str(),
        "code": code.as_str(),
    });
    if let Some(value) = value {
        details["value"] = json!(value);
    }
    Error::invalid_request(message).with_details(details)
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        ErrorCode::MissingField,
        format!("missing required field: {}", field.as_str()),
        None,
    )
}

pub(crate) fn unsupported_value_error(field: FieldName, value: &str, expected: &str) -> Error {
    field_error(
        field,
        ErrorCode::UnsupportedValue,
        format!("{} must be one of {expected}", field.as_str()),
        Some(value),
    )
}

/// Require a field that the body marked optional for error reporting.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse a required identifier field.
pub(crate) fn parse_id<T>(
    value: Option<String>,
    field: FieldName,
    parse: fn(String) -> Result<T, IdValidationError>,
) -> Result<T, Error> {
    let raw = require(value, field)?;
    parse(raw.clone()).map_err(|error| {
        field_error(field, ErrorCode::InvalidUuid, error.to_string(), Some(&raw))
    })
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|timestamp| timestamp.with_timezone(&Utc))
                .map_err(|_| {
                    field_error(
                        field,
                        ErrorCode::InvalidTimestamp,
                        format!("{} must be an RFC 3339 timestamp", field.as_str()),
                        Some(&raw),
                    )
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GuardId;
    use rstest::rstest;

    const GUARD_ID: FieldName = FieldName::new("guardId");

    #[rstest]
    fn missing_id_names_the_field() {
        let error = parse_id(None, GUARD_ID, GuardId::new).expect_err("missing id rejected");
        assert_eq!(
            error.details(),
            Some(&json!({"field": "guardId", "code": "missing_field"}))
        );
    }

    #[rstest]
    fn malformed_id_echoes_the_value() {
        let error = parse_id(Some("guard-7".to_owned()), GUARD_ID, GuardId::new)
            .expect_err("malformed id rejected");
        assert_eq!(
            error.details(),
            Some(&json!({"field": "guardId", "code": "invalid_uuid", "value": "guard-7"}))
        );
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some("2026-03-02T09:00:00Z"), true)]
    #[case(Some("yesterday"), false)]
    fn parses_optional_timestamps(#[case] raw: Option<&str>, #[case] ok: bool) {
        let parsed =
            parse_optional_rfc3339_timestamp(raw.map(str::to_owned), FieldName::new("capturedAt"));
        assert_eq!(parsed.is_ok(), ok);
    }
}
