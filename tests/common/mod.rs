//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use postjoin_fetch::{FetcherConfig, HttpResourceFetcher};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start a mock server that simulates the posts/comments API
pub async fn start_api_mock() -> MockServer {
    MockServer::start().await
}

pub fn fetcher_config(server: &MockServer) -> FetcherConfig {
    FetcherConfig {
        base_url: Some(server.uri()),
        user_agent: Some("postjoin-tests".to_string()),
        timeout_seconds: Some(5),
        connect_timeout_seconds: Some(2),
    }
}

pub fn http_fetcher(server: &MockServer) -> HttpResourceFetcher {
    HttpResourceFetcher::new(&fetcher_config(server)).expect("mock server URI is valid")
}

pub fn post_json(id: u64) -> Value {
    json!({
        "userId": 1,
        "id": id,
        "title": format!("post {id}"),
        "body": format!("body {id}")
    })
}

pub fn comment_json(id: u64, post_id: u64) -> Value {
    json!({
        "postId": post_id,
        "id": id,
        "name": format!("comment {id}"),
        "email": "reader@example.com",
        "body": "first!"
    })
}

/// Mount `GET /posts` returning the given post ids
pub async fn mount_posts(server: &MockServer, ids: &[u64]) {
    let body: Vec<Value> = ids.iter().copied().map(post_json).collect();
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount `GET /posts/{post_id}/comments` returning the given comment ids
pub async fn mount_comments(server: &MockServer, post_id: u64, ids: &[u64]) {
    mount_comments_delayed(server, post_id, ids, Duration::ZERO).await;
}

pub async fn mount_comments_delayed(
    server: &MockServer,
    post_id: u64,
    ids: &[u64],
    delay: Duration,
) {
    let body: Vec<Value> = ids.iter().map(|id| comment_json(*id, post_id)).collect();
    Mock::given(method("GET"))
        .and(path(format!("/posts/{post_id}/comments")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mount a failing status for a path
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
