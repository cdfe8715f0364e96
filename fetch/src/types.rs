//! Configuration and error types for the resource fetcher.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP fetcher configuration.
///
/// Maps to the `[api]` table in config.toml. Every field is optional at this
/// boundary; [`crate::HttpResourceFetcher::new`] resolves the defaults.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct FetcherConfig {
    /// Base URL of the remote API. Default: jsonplaceholder.
    pub base_url: Option<String>,

    /// User-Agent string for HTTP requests.
    pub user_agent: Option<String>,

    /// Whole-request timeout in seconds. Default: 30.
    pub timeout_seconds: Option<u32>,

    /// Connect timeout in seconds. Default: 10.
    pub connect_timeout_seconds: Option<u32>,
}

impl FetcherConfig {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://jsonplaceholder.typicode.com/";

    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECONDS: u32 = 30;

    /// Default connect timeout in seconds.
    pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u32 = 10;

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(Self::DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn timeout_seconds(&self) -> u32 {
        self.timeout_seconds
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECONDS)
    }

    #[must_use]
    pub fn connect_timeout_seconds(&self) -> u32 {
        self.connect_timeout_seconds
            .unwrap_or(Self::DEFAULT_CONNECT_TIMEOUT_SECONDS)
    }
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Connection-level failure (connect, timeout, body read).
    Network,
    /// Non-2xx response.
    HttpStatus,
    /// Payload did not match the expected shape.
    Decode,
}

impl FetchErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::HttpStatus => "http_status",
            Self::Decode => "decode",
        }
    }
}

/// Failure of a single fetch.
///
/// Errors carry the URL and a rendered message rather than the underlying
/// `reqwest`/`serde_json` error so that they stay `Clone + PartialEq` and can
/// be compared in tests and replayed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Network { .. } => FetchErrorKind::Network,
            Self::HttpStatus { .. } => FetchErrorKind::HttpStatus,
            Self::Decode { .. } => FetchErrorKind::Decode,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::HttpStatus { url, .. } | Self::Decode { url, .. } => {
                url
            }
        }
    }

    /// Status code for [`FetchError::HttpStatus`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure to construct an [`crate::HttpResourceFetcher`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL `{0}` must use http or https")]
    UnsupportedScheme(String),

    #[error("base URL `{0}` cannot be used as a base")]
    CannotBeABase(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = FetcherConfig::default();
        assert_eq!(config.base_url(), FetcherConfig::DEFAULT_BASE_URL);
        assert_eq!(config.timeout_seconds(), 30);
        assert_eq!(config.connect_timeout_seconds(), 10);
    }

    #[test]
    fn blank_base_url_falls_back_to_default() {
        let config = FetcherConfig::default().with_base_url("   ");
        assert_eq!(config.base_url(), FetcherConfig::DEFAULT_BASE_URL);
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            FetchError::network("u", "refused").kind(),
            FetchErrorKind::Network
        );
        assert_eq!(
            FetchError::http_status("u", 500).kind(),
            FetchErrorKind::HttpStatus
        );
        assert_eq!(FetchError::decode("u", "eof").kind(), FetchErrorKind::Decode);
    }

    #[test]
    fn status_only_for_http_errors() {
        assert_eq!(FetchError::http_status("u", 404).status(), Some(404));
        assert_eq!(FetchError::network("u", "x").status(), None);
    }

    #[test]
    fn display_includes_url() {
        let err = FetchError::http_status("http://h/posts", 503);
        assert_eq!(err.to_string(), "HTTP 503 fetching http://h/posts");
        assert_eq!(err.url(), "http://h/posts");
    }
}
