use serde::{Deserialize, Deserializer, Serialize};

use crate::movies::repo_types::Movie;

const POSTER_BASE_URL: &str = "http://image.tmdb.org/t/p/w185";
const LARGE_POSTER_BASE_URL: &str = "http://image.tmdb.org/t/p/w342";

/// One entry of the provider's "popular movies" listing. Only the fields the
/// catalog keeps are decoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MovieDto {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub release_date: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Listing and search entry.
#[derive(Debug, Serialize)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub release_date: String,
    pub poster_url: Option<String>,
}

impl From<Movie> for MovieCard {
    fn from(m: Movie) -> Self {
        Self {
            poster_url: poster_url(POSTER_BASE_URL, m.poster_path.as_deref()),
            id: m.id,
            title: m.title,
            release_date: m.release_date,
        }
    }
}

/// Detail view. `trailer_url` is absent when no trailer could be resolved.
#[derive(Debug, Serialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
}

impl MovieDetails {
    pub fn new(m: Movie, trailer_url: Option<String>) -> Self {
        Self {
            poster_url: poster_url(LARGE_POSTER_BASE_URL, m.poster_path.as_deref()),
            id: m.id,
            title: m.title,
            overview: m.overview,
            release_date: m.release_date,
            trailer_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<MovieCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailForm {
    pub movie_id: i64,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn poster_url(base: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty()).map(|p| format!("{base}{p}"))
}
