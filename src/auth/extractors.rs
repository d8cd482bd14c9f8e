use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderMap},
};
use time::Duration;

use crate::{auth::repo_types::UserId, error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "session";

/// `Set-Cookie` value for a freshly issued session. `secure` is only false
/// for local plain-HTTP development.
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Strict",
        ttl.whole_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Cookie value instructing the browser to drop the session cookie.
pub fn cleared_session_cookie(secure: bool) -> String {
    session_cookie("", Duration::ZERO, secure)
}

/// Pull the session token out of the `Cookie` header(s), if present.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

/// Whatever session token the request carries, validated or not.
pub struct MaybeSession(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(session_token(&parts.headers)))
    }
}

/// Guard for protected routes: resolves the logged-in user or redirects the
/// request to the login page.
pub struct AuthUser {
    pub user_id: UserId,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AppError::Unauthenticated)?;
        let user_id = state.sessions.require_authenticated(Some(&token)).await?;
        Ok(AuthUser { user_id, token })
    }
}
