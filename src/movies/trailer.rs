use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{AppError, AppResult},
    providers::youtube::VideoSearch,
};

const EMBED_BASE_URL: &str = "https://www.youtube.com/embed/";

/// Embeddable player URL for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailerLink(String);

impl TrailerLink {
    fn embed(video_id: &str) -> Self {
        Self(format!("{EMBED_BASE_URL}{video_id}"))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Finds a trailer for a movie title. Stateless; holds only the injected
/// search provider.
#[derive(Clone)]
pub struct TrailerResolver {
    search: Arc<dyn VideoSearch>,
}

impl TrailerResolver {
    pub fn new(search: Arc<dyn VideoSearch>) -> Self {
        Self { search }
    }

    pub async fn resolve_trailer(&self, title: &str) -> AppResult<TrailerLink> {
        let query = format!("{title} trailer");
        let video_id = self
            .search
            .top_video_id(&query)
            .await?
            .ok_or_else(|| AppError::Upstream(format!("no video results for {query:?}")))?;
        debug!(%video_id, "trailer resolved");
        Ok(TrailerLink::embed(&video_id))
    }
}
