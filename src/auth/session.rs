use std::{collections::HashMap, fmt, sync::Arc};

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sqlx::SqlitePool;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    auth::{repo_types::UserId, services},
    error::{AppError, AppResult},
};

const TOKEN_BYTES: usize = 32;

/// Opaque session handle given to the client. Never logged.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(Base64UrlUnpadded::encode_string(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Server-side record of a logged-in client. An anonymous client has no
/// record at all, so identity and logged-in state always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    fn new(user_id: UserId, issued_at: OffsetDateTime, ttl: Duration) -> Self {
        Self {
            user_id,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Issues, checks and destroys sessions. Lifetime is absolute from issue;
/// access never extends it.
#[derive(Clone)]
pub struct SessionAuthenticator {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionAuthenticator {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verify credentials and open a session for the matching user.
    pub async fn login(
        &self,
        db: &SqlitePool,
        username: &str,
        password: &str,
    ) -> AppResult<SessionToken> {
        let user_id = services::verify(db, username, password).await?;
        let token = self.start(user_id).await;
        info!(user_id, "user logged in");
        Ok(token)
    }

    /// Open a session for an already-authenticated user.
    pub async fn start(&self, user_id: UserId) -> SessionToken {
        self.start_at(user_id, OffsetDateTime::now_utc()).await
    }

    async fn start_at(&self, user_id: UserId, now: OffsetDateTime) -> SessionToken {
        let token = SessionToken::generate();
        let session = Session::new(user_id, now, self.ttl);
        self.sessions
            .write()
            .await
            .insert(token.as_str().to_owned(), session);
        debug!(user_id, expires_at = %session.expires_at, "session started");
        token
    }

    /// Forget the session. Unknown or already-cleared tokens are fine.
    pub async fn logout(&self, token: &str) {
        if let Some(session) = self.sessions.write().await.remove(token) {
            info!(user_id = session.user_id, "user logged out");
        }
    }

    /// Guard for protected operations.
    pub async fn require_authenticated(&self, token: Option<&str>) -> AppResult<UserId> {
        self.require_authenticated_at(token, OffsetDateTime::now_utc())
            .await
    }

    async fn require_authenticated_at(
        &self,
        token: Option<&str>,
        now: OffsetDateTime,
    ) -> AppResult<UserId> {
        let token = token.ok_or(AppError::Unauthenticated)?;

        let session = self
            .sessions
            .read()
            .await
            .get(token)
            .copied()
            .ok_or(AppError::Unauthenticated)?;

        if session.is_expired_at(now) {
            let mut sessions = self.sessions.write().await;
            if sessions.get(token).is_some_and(|s| s.is_expired_at(now)) {
                sessions.remove(token);
            }
            debug!(user_id = session.user_id, "session expired");
            return Err(AppError::Unauthenticated);
        }

        Ok(session.user_id)
    }

    pub async fn is_logged_in(&self, token: &str) -> bool {
        self.require_authenticated(Some(token)).await.is_ok()
    }

    /// Drop every expired record. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(OffsetDateTime::now_utc()).await
    }

    async fn purge_expired_at(&self, now: OffsetDateTime) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::dto::RegisterForm, db::test_pool};

    fn authenticator() -> SessionAuthenticator {
        SessionAuthenticator::new(Duration::minutes(60))
    }

    #[tokio::test]
    async fn fresh_session_passes_the_guard() {
        let auth = authenticator();
        let token = auth.start(42).await;
        let user_id = auth.require_authenticated(Some(token.as_str())).await.unwrap();
        assert_eq!(user_id, 42);
        assert!(auth.is_logged_in(token.as_str()).await);
    }

    #[tokio::test]
    async fn session_created_61_minutes_ago_is_rejected() {
        let auth = authenticator();
        let issued = OffsetDateTime::now_utc() - Duration::minutes(61);
        let token = auth.start_at(1, issued).await;

        let err = auth
            .require_authenticated(Some(token.as_str()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        // Expired record is dropped on sight.
        assert!(auth.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn expiry_is_absolute_not_sliding() {
        let auth = authenticator();
        let issued = OffsetDateTime::now_utc();
        let token = auth.start_at(1, issued).await;

        let within = issued + Duration::minutes(59);
        auth.require_authenticated_at(Some(token.as_str()), within)
            .await
            .unwrap();

        let after = issued + Duration::minutes(60);
        let err = auth
            .require_authenticated_at(Some(token.as_str()), after)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn missing_or_unknown_token_is_unauthenticated() {
        let auth = authenticator();
        assert!(matches!(
            auth.require_authenticated(None).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            auth.require_authenticated(Some("made-up")).await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn logout_clears_and_is_idempotent() {
        let auth = authenticator();
        let token = auth.start(7).await;

        auth.logout(token.as_str()).await;
        assert!(!auth.is_logged_in(token.as_str()).await);

        auth.logout(token.as_str()).await;
        auth.logout("never-logged-in").await;
        assert!(!auth.is_logged_in("never-logged-in").await);
    }

    #[tokio::test]
    async fn tokens_are_unique_and_url_safe() {
        let auth = authenticator();
        let a = auth.start(1).await;
        let b = auth.start(1).await;
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert!(a
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(format!("{a:?}"), "SessionToken(..)");
    }

    #[tokio::test]
    async fn purge_removes_only_expired_sessions() {
        let auth = authenticator();
        let now = OffsetDateTime::now_utc();
        auth.start_at(1, now - Duration::minutes(120)).await;
        auth.start_at(2, now - Duration::minutes(61)).await;
        let live = auth.start_at(3, now).await;

        assert_eq!(auth.purge_expired_at(now).await, 2);
        assert!(auth.is_logged_in(live.as_str()).await);
    }

    #[tokio::test]
    async fn login_with_valid_and_invalid_credentials() {
        let db = test_pool().await;
        let form = RegisterForm {
            username: "alice".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        };
        let user_id = services::register(&db, &form).await.unwrap();
        let auth = authenticator();

        let err = auth.login(&db, "alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Auth));
        assert!(auth.sessions.read().await.is_empty());

        let token = auth.login(&db, "alice", "secret1").await.unwrap();
        assert_eq!(
            auth.require_authenticated(Some(token.as_str())).await.unwrap(),
            user_id
        );
    }
}
