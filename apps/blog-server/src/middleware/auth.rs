//! Authentication extractors.
//!
//! A request is authenticated by a JWT taken from the `Authorization: Bearer`
//! header or, failing that, the `access_token` cookie set at login. The
//! token's subject is looked up on every request so handlers always see the
//! current user record.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use futures::future::LocalBoxFuture;

use blog_core::domain::User;
use blog_core::ports::{AuthError, BaseRepository};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Cookie holding the session JWT.
pub const AUTH_COOKIE: &str = "access_token";

/// The signed-in user. Extracting it on a route makes the route login-only:
/// anonymous requests are redirected to the login page.
///
/// ```ignore
/// async fn create_post(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
}

impl Identity {
    pub fn id(&self) -> uuid::Uuid {
        self.user.id
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<User>);

impl OptionalIdentity {
    pub fn id(&self) -> Option<uuid::Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::to_string)
}

fn session_token(req: &HttpRequest) -> Option<String> {
    bearer_token(req).or_else(|| req.cookie(AUTH_COOKIE).map(|c| c.value().to_string()))
}

/// Path plus query of the request, used as the post-login `next` target.
fn current_path(req: &HttpRequest) -> String {
    match req.uri().path_and_query() {
        Some(pq) => pq.as_str().to_string(),
        None => req.path().to_string(),
    }
}

async fn resolve_user(req: &HttpRequest) -> Result<Option<User>, AppError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        return Err(AppError::Internal("AppState not found in app data".to_string()));
    };

    let Some(token) = session_token(req) else {
        return Ok(None);
    };

    let claims = match state.tokens.validate_token(&token) {
        Ok(claims) => claims,
        Err(AuthError::TokenExpired) => {
            tracing::debug!("Session token expired");
            return Ok(None);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected session token");
            return Ok(None);
        }
    };

    let user = state.users.find_by_id(claims.user_id).await?;
    if user.is_none() {
        tracing::debug!(user_id = %claims.user_id, "Token subject no longer exists");
    }
    Ok(user)
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match resolve_user(&req).await? {
                Some(user) => Ok(Identity { user }),
                None => Err(AppError::LoginRequired(current_path(&req))),
            }
        })
    }
}

impl FromRequest for OptionalIdentity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(OptionalIdentity(resolve_user(&req).await?)) })
    }
}
