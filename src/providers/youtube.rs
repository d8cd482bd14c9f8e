use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{send_with_retry, ProviderError};
use crate::config::YouTubeConfig;

/// Keyword video search; only the top hit matters.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn top_video_id(&self, query: &str) -> Result<Option<String>, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct SearchList {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: ResourceId,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

/// YouTube Data API v3 `search.list` client.
#[derive(Clone)]
pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Real client when a key is configured, otherwise a search that always
    /// reports the provider as unavailable.
    pub fn from_config(client: reqwest::Client, config: &YouTubeConfig) -> Arc<dyn VideoSearch> {
        match &config.api_key {
            Some(key) => Arc::new(Self::new(client, &config.base_url, key.clone())),
            None => Arc::new(DisabledVideoSearch),
        }
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    #[instrument(skip(self))]
    async fn top_video_id(&self, query: &str) -> Result<Option<String>, ProviderError> {
        let req = self.client.get(format!("{}/search", self.base_url)).query(&[
            ("part", "snippet"),
            ("q", query),
            ("maxResults", "1"),
            ("type", "video"),
            ("key", self.api_key.as_str()),
        ]);

        let list: SearchList = send_with_retry(req).await?.json().await?;
        let video_id = list.items.into_iter().next().and_then(|item| item.id.video_id);
        debug!(found = video_id.is_some(), "video search done");
        Ok(video_id)
    }
}

pub struct DisabledVideoSearch;

#[async_trait]
impl VideoSearch for DisabledVideoSearch {
    async fn top_video_id(&self, _query: &str) -> Result<Option<String>, ProviderError> {
        Err(ProviderError::NotConfigured("YouTube"))
    }
}
