//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The session cookie is issued by the identity service; this adapter only
//! reads the user and tenant it carries and turns them into an explicit
//! [`FieldOpsContext`].

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, FieldOpsContext, IdValidationError, TenantId, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const TENANT_ID_KEY: &str = "tenant_id";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store the user and tenant ids, as the identity service would.
    #[cfg(any(test, feature = "test-support"))]
    pub fn persist_identity(
        &self,
        user_id: &UserId,
        tenant_id: Option<&TenantId>,
    ) -> Result<(), Error> {
        let persist = |key: &str, value: String| {
            self.0
                .insert(key, value)
                .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
        };
        persist(USER_ID_KEY, user_id.to_string())?;
        if let Some(tenant_id) = tenant_id {
            persist(TENANT_ID_KEY, tenant_id.to_string())?;
        }
        Ok(())
    }

    fn read_id<T>(
        &self,
        key: &str,
        parse: fn(String) -> Result<T, IdValidationError>,
    ) -> Result<Option<T>, Error> {
        let raw = self
            .0
            .get::<String>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|raw| match parse(raw) {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::warn!(key, "invalid id in session cookie: {error}");
                None
            }
        }))
    }

    /// Fetch the current user id from the session, if present.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        self.read_id(USER_ID_KEY, UserId::new)
    }

    /// Fetch the current tenant id from the session, if present.
    pub fn tenant_id(&self) -> Result<Option<TenantId>, Error> {
        self.read_id(TENANT_ID_KEY, TenantId::new)
    }

    /// Require an authenticated user id or return `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Build the field operations context for an authenticated request.
    ///
    /// A `claimed_user` taken from the request body must match the session
    /// user; a mismatch is `403 Forbidden`.
    pub fn field_ops_context(
        &self,
        claimed_user: Option<UserId>,
    ) -> Result<FieldOpsContext, Error> {
        let user_id = self.require_user_id()?;
        if claimed_user.is_some_and(|claimed| claimed != user_id) {
            return Err(Error::forbidden("userId does not match the session user"));
        }
        Ok(FieldOpsContext {
            user_id: Some(user_id),
            tenant_id: self.tenant_id()?,
        })
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
