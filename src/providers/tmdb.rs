use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{send_with_retry, ProviderError};
use crate::{config::TmdbConfig, movies::dto::MovieDto};

/// Source of the "popular movies" listing.
#[async_trait]
pub trait MovieProvider: Send + Sync {
    async fn popular(&self) -> Result<Vec<MovieDto>, ProviderError>;
}

/// Entries stay raw so one malformed movie does not sink the page.
#[derive(Debug, Deserialize)]
struct PopularPage {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

impl PopularPage {
    fn into_movies(self) -> Vec<MovieDto> {
        self.results
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<MovieDto>(entry) {
                Ok(movie) => Some(movie),
                Err(e) => {
                    warn!(error = %e, "skipping malformed provider entry");
                    None
                }
            })
            .collect()
    }
}

/// TMDB v3 client.
#[derive(Clone)]
pub struct TmdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    read_token: Option<String>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, config: &TmdbConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            read_token: config.read_token.clone(),
        }
    }
}

#[async_trait]
impl MovieProvider for TmdbClient {
    #[instrument(skip(self))]
    async fn popular(&self) -> Result<Vec<MovieDto>, ProviderError> {
        if self.api_key.is_none() && self.read_token.is_none() {
            return Err(ProviderError::NotConfigured("TMDB"));
        }

        let mut req = self
            .client
            .get(format!("{}/movie/popular", self.base_url))
            .header(ACCEPT, "application/json")
            .query(&[("language", "en-US"), ("page", "1")]);
        if let Some(key) = &self.api_key {
            req = req.query(&[("api_key", key)]);
        }
        if let Some(token) = &self.read_token {
            req = req.bearer_auth(token);
        }

        let page: PopularPage = send_with_retry(req).await?.json().await?;
        let fetched = page.results.len();
        let movies = page.into_movies();
        debug!(fetched, decoded = movies.len(), "popular movies fetched");
        Ok(movies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{http_client, spawn_fake};
    use axum::{extract::Query, http::HeaderMap, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::{collections::HashMap, time::Duration};

    async fn popular(Query(q): Query<HashMap<String, String>>, headers: HeaderMap) -> Json<Value> {
        assert_eq!(q.get("api_key").map(String::as_str), Some("k"));
        assert_eq!(q.get("language").map(String::as_str), Some("en-US"));
        assert_eq!(q.get("page").map(String::as_str), Some("1"));
        assert_eq!(headers.get("authorization").unwrap(), "Bearer t");
        Json(json!({
            "page": 1,
            "results": [
                {"id": 1, "title": "Spider-Man: Across the Spider-Verse",
                 "overview": "Miles", "release_date": "2023-05-31",
                 "poster_path": "/poster_path_1.jpg", "popularity": 2972.5},
                {"id": 2, "title": "Mutant Mayhem", "overview": "",
                 "release_date": "2023-07-31", "poster_path": null}
            ]
        }))
    }

    fn config(base_url: String, api_key: Option<&str>, read_token: Option<&str>) -> TmdbConfig {
        TmdbConfig {
            base_url,
            api_key: api_key.map(Into::into),
            read_token: read_token.map(Into::into),
        }
    }

    #[tokio::test]
    async fn fetches_and_decodes_popular_movies() {
        let base = spawn_fake(Router::new().route("/movie/popular", get(popular))).await;
        let client = TmdbClient::new(
            http_client(Duration::from_secs(5)).unwrap(),
            &config(format!("{base}/"), Some("k"), Some("t")),
        );

        let movies = client.popular().await.unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].id, 1);
        assert_eq!(movies[0].poster_path.as_deref(), Some("/poster_path_1.jpg"));
        assert_eq!(movies[1].poster_path, None);
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped_not_fatal() {
        let app = Router::new().route(
            "/movie/popular",
            get(|| async {
                Json(json!({
                    "results": [
                        {"id": 3, "title": "X", "overview": null,
                         "release_date": null, "poster_path": null},
                        {"id": "not-a-number", "title": "Broken"},
                        {"id": 5},
                        {"id": 6, "title": "Fine", "overview": "ok",
                         "release_date": "2023-01-01"}
                    ]
                }))
            }),
        );
        let base = spawn_fake(app).await;
        let client = TmdbClient::new(
            http_client(Duration::from_secs(5)).unwrap(),
            &config(base, Some("k"), None),
        );

        let movies = client.popular().await.unwrap();
        let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 6]);
        assert_eq!(movies[0].release_date, "");
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_a_request() {
        let client = TmdbClient::new(
            reqwest::Client::new(),
            &config("http://127.0.0.1:9".into(), None, None),
        );
        assert!(matches!(
            client.popular().await,
            Err(ProviderError::NotConfigured("TMDB"))
        ));
    }
}
