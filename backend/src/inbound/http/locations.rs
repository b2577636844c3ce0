//! Location ingestion HTTP handler.
//!
//! ```text
//! POST /api/v1/locations
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::RecordLocationRequest;
use crate::domain::{Error, GuardId, LocationReport, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_id, parse_optional_rfc3339_timestamp, require,
};

/// Request payload for a location fix.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordLocationRequestBody {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Ground speed in meters per second.
    pub speed: Option<f64>,
    /// Heading in degrees clockwise from north.
    pub direction: Option<f64>,
    #[schema(format = "uuid")]
    pub guard_id: Option<String>,
    /// Must match the session user when present.
    #[schema(format = "uuid")]
    pub user_id: Option<String>,
    /// Capture instant on the handset; defaults to receipt time.
    #[schema(format = "date-time")]
    pub captured_at: Option<String>,
}

/// Stored location report.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationReportResponseBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub guard_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub direction: Option<f64>,
    #[schema(format = "date-time")]
    pub captured_at: String,
}

impl From<LocationReport> for LocationReportResponseBody {
    fn from(report: LocationReport) -> Self {
        Self {
            id: report.id().to_string(),
            guard_id: report.guard_id().to_string(),
            latitude: report.position().latitude(),
            longitude: report.position().longitude(),
            speed: report.speed(),
            direction: report.direction(),
            captured_at: report.captured_at().to_rfc3339(),
        }
    }
}

fn parse_location_request(
    body: RecordLocationRequestBody,
) -> Result<(Option<UserId>, RecordLocationRequest), Error> {
    let claimed_user = body
        .user_id
        .map(|raw| parse_id(Some(raw), FieldName::new("userId"), UserId::new))
        .transpose()?;
    let request = RecordLocationRequest {
        guard_id: parse_id(body.guard_id, FieldName::new("guardId"), GuardId::new)?,
        latitude: require(body.latitude, FieldName::new("latitude"))?,
        longitude: require(body.longitude, FieldName::new("longitude"))?,
        speed: body.speed,
        direction: body.direction,
        captured_at: parse_optional_rfc3339_timestamp(
            body.captured_at,
            FieldName::new("capturedAt"),
        )?,
    };
    Ok((claimed_user, request))
}

/// Store a location fix and run breach evaluation on it.
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = RecordLocationRequestBody,
    responses(
        (status = 201, description = "Location stored", body = LocationReportResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "userId does not match the session", body = ErrorSchema),
        (status = 500, description = "Persistence failure", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["field-operations"],
    operation_id = "recordLocation",
    security(("SessionCookie" = []))
)]
#[post("/locations")]
pub async fn record_location(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RecordLocationRequestBody>,
) -> ApiResult<HttpResponse> {
    let (claimed_user, request) = parse_location_request(payload.into_inner())?;
    let ctx = session.field_ops_context(claimed_user)?;
    let report = state.locations.record_location(ctx, request).await?;
    Ok(HttpResponse::Created().json(LocationReportResponseBody::from(report)))
}

#[cfg(test)]
#[path = "locations_tests.rs"]
mod tests;
