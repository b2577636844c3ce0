//! OpenAPI documentation for the field operations API.
//!
//! Registers the ingestion endpoints, the alert stream upgrade and the
//! health probes, plus schema wrappers that describe domain types without
//! deriving `ToSchema` on them. Swagger UI serves the document in debug
//! builds.

use crate::inbound::http::attendance::{AttendanceResponseBody, RecordAttendanceRequestBody};
use crate::inbound::http::locations::{LocationReportResponseBody, RecordLocationRequestBody};
use crate::inbound::http::schemas::{AlertEventSchema, ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by the identity service.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Guardpost field operations API",
        description = "Location ingestion, attendance and the real-time alert stream."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::locations::record_location,
        crate::inbound::http::attendance::record_attendance,
        crate::inbound::ws::alerts_entry,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        AlertEventSchema,
        RecordLocationRequestBody,
        LocationReportResponseBody,
        RecordAttendanceRequestBody,
        AttendanceResponseBody,
    )),
    tags(
        (name = "field-operations", description = "Guard location, attendance and alerts"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
