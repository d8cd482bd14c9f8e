use sqlx::FromRow;

use crate::movies::dto::MovieDto;

/// Cached catalog row, keyed by the metadata provider's id.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub poster_path: Option<String>,
}

impl From<MovieDto> for Movie {
    fn from(d: MovieDto) -> Self {
        Self {
            id: d.id,
            title: d.title,
            overview: d.overview,
            release_date: d.release_date,
            poster_path: d.poster_path,
        }
    }
}
