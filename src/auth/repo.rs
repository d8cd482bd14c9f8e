use crate::auth::repo_types::{User, UserId};
use sqlx::SqlitePool;

impl User {
    /// Find a user by username.
    pub async fn find_by_username(db: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user. The `UNIQUE` constraint on `username` rejects a
    /// duplicate even when two registrations race past the existence check.
    pub async fn create(db: &SqlitePool, username: &str, password_hash: &str) -> sqlx::Result<UserId> {
        let id = sqlx::query_scalar::<_, UserId>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES (?, ?)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(id)
    }

    #[cfg(test)]
    pub async fn count(db: &SqlitePool) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await
    }
}
