//! Typed access to the remote posts/comments API.
//!
//! The orchestration layer depends only on the [`ResourceFetcher`] trait. This
//! crate also ships the production implementation, [`HttpResourceFetcher`],
//! built on a shared `reqwest` client.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | [`ResourceFetcher::fetch_posts`] | `GET <base>/posts` |
//! | [`ResourceFetcher::fetch_comments`] | `GET <base>/posts/{id}/comments` |
//!
//! # Error Handling
//!
//! Every failure is a [`FetchError`] of one of three kinds: network
//! (transport or timeout), HTTP status (non-2xx), or decode (payload shape).
//! Nothing is retried or cached; each call issues exactly one request.
//! Constructing the fetcher fails separately with [`BuildError`].

mod http;
mod resolved;
mod types;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use postjoin_types::{Comment, Post, PostId};

pub use http::HttpResourceFetcher;
pub use types::{BuildError, FetchError, FetchErrorKind, FetcherConfig};

/// Fetch future type alias.
pub type FetchFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// Source of posts and their comments.
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the full post list with one request.
    fn fetch_posts(&self) -> FetchFut<'_, Vec<Post>>;

    /// Fetch the comments of one post with one request.
    fn fetch_comments(&self, post_id: PostId) -> FetchFut<'_, Vec<Comment>>;
}

impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Arc<T> {
    fn fetch_posts(&self) -> FetchFut<'_, Vec<Post>> {
        (**self).fetch_posts()
    }

    fn fetch_comments(&self, post_id: PostId) -> FetchFut<'_, Vec<Comment>> {
        (**self).fetch_comments(post_id)
    }
}
