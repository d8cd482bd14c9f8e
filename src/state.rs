use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::auth::session::SessionAuthenticator;
use crate::config::AppConfig;
use crate::movies::{services::CatalogSynchronizer, trailer::TrailerResolver};
use crate::providers::{
    http_client,
    tmdb::{MovieProvider, TmdbClient},
    youtube::{VideoSearch, YouTubeClient},
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub sessions: SessionAuthenticator,
    pub catalog: CatalogSynchronizer,
    pub trailers: TrailerResolver,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = crate::db::connect(&config.database_url).await?;

        let http = http_client(Duration::from_secs(config.upstream_timeout_secs))?;
        if config.tmdb.api_key.is_none() && config.tmdb.read_token.is_none() {
            tracing::warn!("TMDB credentials missing; listing will only show cached movies");
        }
        if config.youtube.api_key.is_none() {
            tracing::warn!("YOUTUBE_API_KEY missing; detail pages will have no trailer");
        }
        let movies = Arc::new(TmdbClient::new(http.clone(), &config.tmdb)) as Arc<dyn MovieProvider>;
        let videos = YouTubeClient::from_config(http, &config.youtube);

        Ok(Self::from_parts(db, config, movies, videos))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        movies: Arc<dyn MovieProvider>,
        videos: Arc<dyn VideoSearch>,
    ) -> Self {
        let sessions =
            SessionAuthenticator::new(time::Duration::minutes(config.session.ttl_minutes));
        Self {
            catalog: CatalogSynchronizer::new(db.clone(), movies),
            trailers: TrailerResolver::new(videos),
            sessions,
            db,
            config,
        }
    }
}
