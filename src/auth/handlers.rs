use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use tracing::{debug, info, instrument};

use crate::{
    auth::{
        dto::{LoginForm, RegisterForm},
        extractors::{cleared_session_cookie, session_cookie, AuthUser, MaybeSession},
        services,
        session::SessionToken,
    },
    error::{AppError, AppResult},
    state::AppState,
};

const LOGIN_PAGE: &str = include_str!("../../templates/login.html");
const REGISTER_PAGE: &str = include_str!("../../templates/register.html");

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/register", get(register_page).post(register))
}

/// Redirect that also hands the client its session cookie.
fn redirect_with_session(state: &AppState, token: &SessionToken, to: &str) -> impl IntoResponse {
    let cookie = session_cookie(
        token.as_str(),
        state.sessions.ttl(),
        state.config.session.cookie_secure,
    );
    ([(SET_COOKIE, cookie)], Redirect::to(to))
}

/// Reaching the login page forgets whoever was logged in on this client.
async fn forget_session(state: &AppState, session: Option<String>) {
    if let Some(token) = session {
        if state.sessions.is_logged_in(&token).await {
            debug!("ending active session");
        }
        state.sessions.logout(&token).await;
    }
}

#[instrument(skip_all)]
pub async fn login_page(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Html<&'static str> {
    forget_session(&state, session).await;
    Html(LOGIN_PAGE)
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Form(form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    forget_session(&state, session).await;

    if form.username.is_empty() {
        return Err(AppError::Validation("must enter username".into()));
    }
    if form.password.is_empty() {
        return Err(AppError::Validation("must enter password".into()));
    }

    let token = state
        .sessions
        .login(&state.db, &form.username, &form.password)
        .await?;
    Ok(redirect_with_session(&state, &token, "/"))
}

#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    state.sessions.logout(&user.token).await;
    let cookie = cleared_session_cookie(state.config.session.cookie_secure);
    ([(SET_COOKIE, cookie)], Redirect::to("/login"))
}

pub async fn register_page() -> Html<&'static str> {
    Html(REGISTER_PAGE)
}

/// Create the account and log the new user straight in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<impl IntoResponse> {
    let user_id = services::register(&state.db, &form).await?;
    let token = state.sessions.start(user_id).await;
    info!(user_id, "new user logged in");
    Ok(redirect_with_session(&state, &token, "/"))
}
