use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    movies::repo_types::Movie,
};

impl Movie {
    /// Insert unless a row with this id exists. Existing rows are never
    /// overwritten, even if the provider's data changed. Returns whether a
    /// row was inserted.
    pub async fn upsert_if_absent(db: &SqlitePool, movie: &Movie) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO movies (id, title, overview, release_date, poster_path)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.overview)
        .bind(&movie.release_date)
        .bind(&movie.poster_path)
        .execute(db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// All cached movies, newest release first.
    pub async fn list_all(db: &SqlitePool) -> sqlx::Result<Vec<Movie>> {
        sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, overview, release_date, poster_path
            FROM movies
            ORDER BY release_date DESC, id ASC
            "#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn get(db: &SqlitePool, id: i64) -> AppResult<Movie> {
        sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, overview, release_date, poster_path
            FROM movies
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound(id))
    }

    /// Case-insensitive substring match on the title only. Matching folds
    /// full Unicode case, which SQLite's `LIKE` does not, so it runs here.
    pub async fn search(db: &SqlitePool, needle: &str) -> sqlx::Result<Vec<Movie>> {
        let needle = needle.to_lowercase();
        let movies = Self::list_all(db).await?;
        Ok(movies
            .into_iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .collect())
    }

    #[cfg(test)]
    pub async fn count(db: &SqlitePool) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM movies")
            .fetch_one(db)
            .await
    }
}
