//! WebSocket inbound adapter streaming alert events to dashboards.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, session, room access)
//! - subscribe the connection to one alert room
//! - keep WebSocket framing at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use serde::Deserialize;
use tracing::{error, info, warn};
use url::Url;

use crate::domain::{AlertRoom, Error, FieldOpsContext};
use crate::inbound::http::session::SessionContext;

mod session;

pub mod state;

/// Query string for `/ws/alerts`.
#[derive(Debug, Deserialize)]
pub struct AlertStreamQuery {
    /// `guard-{id}`, `user-{id}` or `tenant-{id}`.
    pub room: Option<String>,
}

/// Upgrade to a WebSocket that receives every alert published to `room`.
#[utoipa::path(
    get,
    path = "/ws/alerts",
    params(("room" = String, Query, description = "guard-{id}, user-{id} or tenant-{id}")),
    responses(
        (status = 101, description = "Switching to the alert stream", body = crate::inbound::http::schemas::AlertEventSchema),
        (status = 400, description = "Missing or malformed room, or bad Origin"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Origin or room not allowed")
    ),
    tags = ["field-operations"],
    operation_id = "streamAlerts",
    security(("SessionCookie" = []))
)]
#[get("/ws/alerts")]
pub async fn alerts_entry(
    state: web::Data<state::WsState>,
    session: SessionContext,
    query: web::Query<AlertStreamQuery>,
    req: HttpRequest,
    body: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(origin_header)?;

    let room = parse_room(query.into_inner().room)?;
    let ctx = session.field_ops_context(None)?;
    authorize_room(&ctx, &room)?;

    let (response, ws_session, messages) = actix_ws::handle(&req, body).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;
    info!(%room, "alert stream opened");
    let events = state.feed.subscribe(&room);
    actix_web::rt::spawn(session::stream_alerts(room, events, ws_session, messages));
    Ok(response)
}

fn parse_room(raw: Option<String>) -> Result<AlertRoom, Error> {
    let raw = raw.ok_or_else(|| {
        Error::invalid_request("missing required query parameter: room")
            .with_details(serde_json::json!({ "field": "room", "code": "missing_field" }))
    })?;
    raw.parse().map_err(|error: crate::domain::AlertRoomParseError| {
        Error::invalid_request(error.to_string()).with_details(serde_json::json!({
            "field": "room",
            "code": "invalid_room",
            "value": raw,
        }))
    })
}

/// Guard rooms are open to any signed-in user; user and tenant rooms only to
/// their owner.
fn authorize_room(ctx: &FieldOpsContext, room: &AlertRoom) -> Result<(), Error> {
    let allowed = match room {
        AlertRoom::Guard(_) => true,
        AlertRoom::User(user_id) => ctx.user_id == Some(*user_id),
        AlertRoom::Tenant(tenant_id) => ctx.tenant_id == Some(*tenant_id),
    };
    if allowed {
        Ok(())
    } else {
        warn!(%room, "rejected alert stream for a foreign room");
        Err(Error::forbidden("room not accessible to this session"))
    }
}

fn validate_origin(origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = origin_header.to_str().map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as string");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;
    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if is_allowed_origin(&origin) {
        Ok(())
    } else {
        warn!(origin = origin_value, "Rejected WS upgrade due to disallowed Origin");
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

const PRIMARY_HOST: &str = "guardpost.example";
const LOCALHOST: &str = "localhost";
const ALLOWED_SUBDOMAIN_SUFFIX: &str = ".guardpost.example";

/// HTTPS from the production domain and its subdomains, or HTTP from
/// localhost on an explicit non-zero port.
fn is_allowed_origin(origin: &Url) -> bool {
    let Some(host) = origin.host_str() else {
        return false;
    };
    match origin.scheme() {
        "http" if host == LOCALHOST => matches!(origin.port(), Some(port) if port != 0),
        "https" if host == PRIMARY_HOST => true,
        "https" => host.ends_with(ALLOWED_SUBDOMAIN_SUFFIX),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GuardId, TenantId, UserId};
    use actix_web::http::StatusCode;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:4000", true)]
    #[case("http://localhost:0", false)]
    #[case("http://localhost", false)]
    #[case("https://guardpost.example", true)]
    #[case("https://ops.guardpost.example", true)]
    #[case("https://guardpost.example.evil.com", false)]
    #[case("wss://guardpost.example", false)]
    fn evaluates_allow_list(#[case] origin: &str, #[case] expected: bool) {
        let parsed = Url::parse(origin).expect("url should parse");
        assert_eq!(is_allowed_origin(&parsed), expected);
    }

    #[rstest]
    #[case(HeaderValue::from_static("not a url"), StatusCode::BAD_REQUEST)]
    #[case(HeaderValue::from_static("https://example.com"), StatusCode::FORBIDDEN)]
    #[case(
        HeaderValue::from_bytes(&[0x80]).expect("opaque header value"),
        StatusCode::BAD_REQUEST
    )]
    fn rejects_bad_origins(#[case] header: HeaderValue, #[case] expected: StatusCode) {
        let error = validate_origin(&header).expect_err("origin rejected");
        assert_eq!(error.as_response_error().status_code(), expected);
    }

    #[test]
    fn missing_room_is_invalid_request() {
        let error = parse_room(None).expect_err("room required");
        assert_eq!(error.code(), crate::domain::ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[case("guard")]
    #[case("shift-3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[case("guard-nope")]
    fn malformed_room_names_field(#[case] raw: &str) {
        let error = parse_room(Some(raw.to_owned())).expect_err("room rejected");
        let details = error.details().expect("details");
        assert_eq!(details["field"], "room");
        assert_eq!(details["code"], "invalid_room");
    }

    #[test]
    fn room_access_follows_session_identity() {
        let user = UserId::random();
        let tenant = TenantId::random();
        let ctx = FieldOpsContext {
            user_id: Some(user),
            tenant_id: Some(tenant),
        };
        assert!(authorize_room(&ctx, &AlertRoom::Guard(GuardId::random())).is_ok());
        assert!(authorize_room(&ctx, &AlertRoom::User(user)).is_ok());
        assert!(authorize_room(&ctx, &AlertRoom::Tenant(tenant)).is_ok());
        assert!(authorize_room(&ctx, &AlertRoom::User(UserId::random())).is_err());
        assert!(authorize_room(&ctx, &AlertRoom::Tenant(TenantId::random())).is_err());
    }
}
