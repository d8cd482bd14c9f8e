use sqlx::FromRow;

pub type UserId = i64;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,           // autoincrement row id
    pub username: String,     // unique
    pub password_hash: String, // Argon2 PHC string, never exposed
}
