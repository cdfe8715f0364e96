//! Resolved, invariant-safe fetcher configuration.
//!
//! Converts the optional, boundary-level [`FetcherConfig`] into concrete
//! values so the request path never handles `Option` or re-parses URLs.
use std::time::Duration;

use postjoin_types::PostId;
use url::Url;

use crate::types::{BuildError, FetcherConfig};

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("postjoin/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    /// Always ends with `/` so relative joins extend the path.
    pub base_url: Url,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl ResolvedConfig {
    pub fn from_config(config: &FetcherConfig) -> Result<Self, BuildError> {
        let base_url = parse_base_url(config.base_url())?;

        let user_agent = config
            .user_agent
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let timeout = Duration::from_secs(u64::from(config.timeout_seconds().max(1)));
        let connect_timeout =
            Duration::from_secs(u64::from(config.connect_timeout_seconds().max(1)));

        Ok(Self {
            base_url,
            user_agent,
            timeout,
            connect_timeout,
        })
    }

    pub fn posts_url(&self) -> Url {
        self.endpoint("posts")
    }

    pub fn comments_url(&self, post_id: PostId) -> Url {
        self.endpoint(&format!("posts/{post_id}/comments"))
    }

    fn endpoint(&self, relative: &str) -> Url {
        // The base is validated as a hierarchical http(s) URL with a trailing
        // slash, so joining a plain relative path cannot fail.
        self.base_url
            .join(relative)
            .unwrap_or_else(|_| self.base_url.clone())
    }
}

fn parse_base_url(raw: &str) -> Result<Url, BuildError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|source| BuildError::InvalidBaseUrl {
        url: trimmed.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(BuildError::UnsupportedScheme(trimmed.to_string()));
    }
    if url.cannot_be_a_base() {
        return Err(BuildError::CannotBeABase(trimmed.to_string()));
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
