//! `reqwest`-backed [`ResourceFetcher`].

use postjoin_types::{Comment, Post, PostId};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use url::Url;

use crate::resolved::ResolvedConfig;
use crate::types::{BuildError, FetchError, FetcherConfig};
use crate::{FetchFut, ResourceFetcher};

/// Fetches posts and comments over HTTP.
///
/// One client (and its connection pool) is shared by every request issued
/// through this fetcher, including concurrent comment fetches.
#[derive(Debug, Clone)]
pub struct HttpResourceFetcher {
    client: reqwest::Client,
    config: ResolvedConfig,
}

impl HttpResourceFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, BuildError> {
        let config = ResolvedConfig::from_config(config)?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        tracing::debug!(
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            "HTTP fetcher ready"
        );

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let url_text = url.to_string();
        tracing::debug!(url = %url_text, "GET");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url_text, error = %e, "request failed");
                FetchError::network(&url_text, describe_transport_error(&e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url_text, status = status.as_u16(), "non-success status");
            return Err(FetchError::http_status(&url_text, status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::warn!(url = %url_text, error = %e, "failed reading response body");
            FetchError::network(&url_text, describe_transport_error(&e))
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(url = %url_text, error = %e, "response did not match expected shape");
            FetchError::decode(&url_text, e.to_string())
        })
    }
}

impl ResourceFetcher for HttpResourceFetcher {
    fn fetch_posts(&self) -> FetchFut<'_, Vec<Post>> {
        Box::pin(self.get_json(self.config.posts_url()))
    }

    fn fetch_comments(&self, post_id: PostId) -> FetchFut<'_, Vec<Comment>> {
        Box::pin(self.get_json(self.config.comments_url(post_id)))
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}
