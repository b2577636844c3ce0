//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test as actix_test, web};
use chrono::{DateTime, Utc};

use crate::domain::{
    AlertEmitter, AttendanceCommandService, AttendancePolicy, BreachAlertMode, Error,
    LocationCommandService, TenantId, UserId,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::test_support::{InMemoryFieldOps, MutableClock, RecordingBroadcaster};

/// Session middleware with a fresh key, cookie name `session`, and the
/// `Secure` flag off for plain HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Real services over one in-memory store, frozen at `now`.
pub struct FieldOpsHarness {
    pub store: InMemoryFieldOps,
    pub broadcaster: RecordingBroadcaster,
    pub clock: Arc<MutableClock>,
    pub state: HttpState,
}

impl FieldOpsHarness {
    pub fn new(now: DateTime<Utc>) -> Self {
        let store = InMemoryFieldOps::new();
        let broadcaster = RecordingBroadcaster::default();
        let clock = Arc::new(MutableClock::new(now));
        let emitter = AlertEmitter::new(
            Arc::new(store.clone()),
            Arc::new(broadcaster.clone()),
            clock.clone(),
        );
        let state = HttpState::new(
            Arc::new(LocationCommandService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                emitter.clone(),
                BreachAlertMode::Episode,
            )),
            Arc::new(AttendanceCommandService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                emitter,
                AttendancePolicy::default(),
            )),
        );
        Self {
            store,
            broadcaster,
            clock,
            state,
        }
    }
}

/// Route that stamps the posted identity into the session cookie.
pub const SIGN_IN_PATH: &str = "/test/sign-in";

#[derive(serde::Serialize, serde::Deserialize)]
pub struct SignInBody {
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
}

pub async fn sign_in_handler(
    session: SessionContext,
    body: web::Json<SignInBody>,
) -> Result<HttpResponse, Error> {
    session.persist_identity(&body.user_id, body.tenant_id.as_ref())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Sign in through [`SIGN_IN_PATH`] and return the session cookie.
pub async fn sign_in<S>(app: &S, user_id: UserId, tenant_id: Option<TenantId>) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = actix_test::TestRequest::post()
        .uri(SIGN_IN_PATH)
        .set_json(SignInBody { user_id, tenant_id })
        .to_request();
    let res = actix_test::call_service(app, req).await;
    assert!(res.status().is_success(), "sign-in failed: {}", res.status());
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}
