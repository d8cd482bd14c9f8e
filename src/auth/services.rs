use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::RegisterForm,
        password::{hash_password, verify_password},
        repo_types::{User, UserId},
    },
    error::{is_unique_violation, AppError, AppResult},
};

const USERNAME_TAKEN: &str = "Username already exists";

fn validate_registration(form: &RegisterForm) -> AppResult<()> {
    let problem = if form.username.is_empty() {
        "No username entered"
    } else if form.password.is_empty() {
        "No password entered"
    } else if form.confirm_password.is_empty() {
        "Please confirm password"
    } else if form.password != form.confirm_password {
        "Passwords don't match"
    } else {
        return Ok(());
    };
    Err(AppError::Validation(problem.into()))
}

/// Create a user and return its id. Exactly one row is inserted on success.
pub async fn register(db: &SqlitePool, form: &RegisterForm) -> AppResult<UserId> {
    validate_registration(form)?;

    if User::find_by_username(db, &form.username).await?.is_some() {
        warn!(username = %form.username, "username already registered");
        return Err(AppError::Conflict(USERNAME_TAKEN.into()));
    }

    let hash = hash_password(&form.password)?;

    match User::create(db, &form.username, &hash).await {
        Ok(id) => {
            info!(user_id = id, username = %form.username, "user registered");
            Ok(id)
        }
        // Lost a race against a concurrent registration of the same name.
        Err(e) if is_unique_violation(&e) => {
            warn!(username = %form.username, "username taken by concurrent registration");
            Err(AppError::Conflict(USERNAME_TAKEN.into()))
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            Err(e.into())
        }
    }
}

/// Check a username/password pair. Unknown user and wrong password produce
/// the same error.
pub async fn verify(db: &SqlitePool, username: &str, password: &str) -> AppResult<UserId> {
    let Some(user) = User::find_by_username(db, username).await? else {
        warn!(username = %username, "login unknown username");
        return Err(AppError::Auth);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = user.id, username = %user.username, "login invalid password");
        return Err(AppError::Auth);
    }

    Ok(user.id)
}
