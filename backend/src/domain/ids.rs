//! Strongly typed identifiers for field operations records.
//!
//! Every record the core touches is keyed by a UUID. Wrapping each in its own
//! newtype keeps a guard id from being passed where a shift id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation error raised when an identifier string is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a valid UUID")]
pub struct IdValidationError {
    kind: &'static str,
}

macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Parse an identifier from its canonical string form.
            pub fn new(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
                let raw = id.as_ref();
                if raw.trim() != raw {
                    return Err(IdValidationError { kind: $label });
                }
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| IdValidationError { kind: $label })
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_uuid_id!(
    /// Identifier of a security guard.
    GuardId,
    "guard id"
);
define_uuid_id!(
    /// Identifier of a scheduled shift.
    ShiftId,
    "shift id"
);
define_uuid_id!(
    /// Identifier of a guarded post (site).
    PostId,
    "post id"
);
define_uuid_id!(
    /// Identifier of a geofence attached to a post.
    GeofenceId,
    "geofence id"
);
define_uuid_id!(
    /// Identifier of a tenant (security company).
    TenantId,
    "tenant id"
);
define_uuid_id!(
    /// Identifier of an authenticated user account.
    UserId,
    "user id"
);
define_uuid_id!(
    /// Identifier of a persisted location report.
    LocationReportId,
    "location report id"
);
define_uuid_id!(
    /// Identifier of an attendance record.
    AttendanceId,
    "attendance id"
);
define_uuid_id!(
    /// Identifier of an alert.
    AlertId,
    "alert id"
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_canonical_uuid() {
        let id = GuardId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
        assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    fn rejects_invalid_input(#[case] raw: &str) {
        let err = ShiftId::new(raw).expect_err("invalid id");
        assert_eq!(err.to_string(), "shift id must be a valid UUID");
    }

    #[rstest]
    fn serializes_as_plain_string() {
        let id = AlertId::random();
        let value = serde_json::to_value(id).expect("id serializes");
        assert_eq!(value, serde_json::Value::String(id.to_string()));
    }
}
