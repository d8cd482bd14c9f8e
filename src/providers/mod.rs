//! HTTP clients for the movie-metadata and video-search providers.
//!
//! Both share one [`reqwest::Client`] with a bounded timeout. A request that
//! times out, cannot connect, or receives a 5xx is retried once.

pub mod tmdb;
pub mod youtube;

use std::time::Duration;

use anyhow::Context;
use reqwest::{RequestBuilder, Response};
use tracing::warn;

use crate::error::AppError;

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Network, TLS, timeout or decode failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with a non-2xx status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0} credentials are not configured")]
    NotConfigured(&'static str),
}

impl ProviderError {
    fn is_transient(&self) -> bool {
        match self {
            ProviderError::Request(e) => e.is_timeout() || e.is_connect(),
            ProviderError::Status { status, .. } => *status >= 500,
            ProviderError::NotConfigured(_) => false,
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("build http client")
}

/// Send `req`, retrying exactly once on a transient failure.
pub(crate) async fn send_with_retry(req: RequestBuilder) -> Result<Response, ProviderError> {
    let retry = req.try_clone();
    match send_once(req).await {
        Err(e) if e.is_transient() => {
            let Some(req) = retry else {
                return Err(e);
            };
            warn!(error = %e, "provider request failed, retrying once");
            send_once(req).await
        }
        other => other,
    }
}

async fn send_once(req: RequestBuilder) -> Result<Response, ProviderError> {
    let res = req.send().await?;
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body: String = res
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY)
        .collect();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Serve `app` on an ephemeral local port and return its base URL.
#[cfg(test)]
pub(crate) async fn spawn_fake(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn counting_router(fail_first: usize, status: StatusCode) -> (Router, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/ping",
            get(move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < fail_first {
                        (status, "nope")
                    } else {
                        (StatusCode::OK, "pong")
                    }
                }
            }),
        );
        (app, hits)
    }

    #[tokio::test]
    async fn retries_once_after_server_error() {
        let (app, hits) = counting_router(1, StatusCode::SERVICE_UNAVAILABLE);
        let base = spawn_fake(app).await;
        let client = http_client(Duration::from_secs(5)).unwrap();

        let res = send_with_retry(client.get(format!("{base}/ping"))).await.unwrap();
        assert_eq!(res.text().await.unwrap(), "pong");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_second_server_error() {
        let (app, hits) = counting_router(usize::MAX, StatusCode::BAD_GATEWAY);
        let base = spawn_fake(app).await;
        let client = http_client(Duration::from_secs(5)).unwrap();

        let err = send_with_retry(client.get(format!("{base}/ping"))).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 502, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (app, hits) = counting_router(usize::MAX, StatusCode::UNAUTHORIZED);
        let base = spawn_fake(app).await;
        let client = http_client(Duration::from_secs(5)).unwrap();

        let err = send_with_retry(client.get(format!("{base}/ping"))).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_errors_become_upstream_errors() {
        let err: AppError = ProviderError::NotConfigured("TMDB").into();
        assert!(matches!(err, AppError::Upstream(msg) if msg.contains("TMDB")));
    }
}
