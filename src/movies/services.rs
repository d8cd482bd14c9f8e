use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::AppResult,
    movies::{dto::MovieDto, repo_types::Movie},
    providers::tmdb::MovieProvider,
};

/// Outcome of one synchronization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Copies the provider's popular movies into the local catalog.
#[derive(Clone)]
pub struct CatalogSynchronizer {
    db: SqlitePool,
    provider: Arc<dyn MovieProvider>,
}

impl CatalogSynchronizer {
    pub fn new(db: SqlitePool, provider: Arc<dyn MovieProvider>) -> Self {
        Self { db, provider }
    }

    /// Fetch the current popular list and sync it. A provider failure is
    /// returned; per-movie storage failures are not.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> AppResult<SyncReport> {
        let movies = self.provider.popular().await?;
        Ok(self.sync(movies).await)
    }

    /// Insert every movie whose id is not yet cached, in the given order.
    /// Safe to repeat with overlapping input. A failed insert is logged and
    /// skipped so the rest of the batch still lands.
    pub async fn sync(&self, movies: Vec<MovieDto>) -> SyncReport {
        let mut report = SyncReport::default();
        for dto in movies {
            let movie = Movie::from(dto);
            match Movie::upsert_if_absent(&self.db, &movie).await {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(error = %e, movie_id = movie.id, "catalog insert failed, skipping");
                    report.failed += 1;
                }
            }
        }
        if report.inserted > 0 || report.failed > 0 {
            info!(?report, "catalog synchronized");
        } else {
            debug!(?report, "catalog already up to date");
        }
        report
    }
}
