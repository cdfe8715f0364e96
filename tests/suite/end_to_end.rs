//! End-to-end runs over HTTP against a mock API.

use std::sync::Arc;
use std::time::Duration;

use postjoin_engine::{
    FetchErrorKind, Orchestrator, OrchestratorConfig, ResourceFetcher, RunError, RunPhase,
};
use postjoin_types::{ConcurrencyLimit, JoinStrategy, PostId};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    http_fetcher, mount_comments, mount_comments_delayed, mount_posts, mount_status,
    start_api_mock,
};

fn orchestrator(server: &MockServer, config: OrchestratorConfig) -> Orchestrator {
    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(http_fetcher(server));
    Orchestrator::new(fetcher, config)
}

fn with_strategy(join_strategy: JoinStrategy) -> OrchestratorConfig {
    OrchestratorConfig {
        join_strategy,
        ..OrchestratorConfig::default()
    }
}

#[tokio::test]
async fn test_two_posts_joined_over_http() {
    for strategy in [JoinStrategy::Inline, JoinStrategy::ScatterMerge] {
        let server = start_api_mock().await;
        mount_posts(&server, &[1, 2]).await;
        mount_comments(&server, 1, &[10]).await;
        mount_comments(&server, 2, &[]).await;

        let output = orchestrator(&server, with_strategy(strategy))
            .run()
            .await
            .expect("run should succeed");

        assert_eq!(output.posts.len(), 2, "{strategy}");
        assert_eq!(output.posts[0].id(), PostId::new(1));
        assert_eq!(output.posts[0].comments.len(), 1);
        assert_eq!(output.posts[0].comments[0].id.value(), 10);
        assert_eq!(output.posts[1].id(), PostId::new(2));
        assert!(output.posts[1].comments.is_empty());
    }
}

#[tokio::test]
async fn test_strategies_agree_with_slow_responses() {
    let server = start_api_mock().await;
    mount_posts(&server, &[1, 2, 3, 4, 5]).await;
    for (post_id, delay_ms) in [(1, 80), (2, 10), (3, 50), (4, 0), (5, 30)] {
        let ids = [post_id * 10, post_id * 10 + 1];
        mount_comments_delayed(&server, post_id, &ids, Duration::from_millis(delay_ms)).await;
    }

    let inline = orchestrator(&server, with_strategy(JoinStrategy::Inline))
        .run()
        .await
        .unwrap();
    let scatter = orchestrator(&server, with_strategy(JoinStrategy::ScatterMerge))
        .run()
        .await
        .unwrap();

    assert_eq!(inline.posts, scatter.posts);
    let ids: Vec<u64> = inline.posts.iter().map(|p| p.id().value()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_limit_caps_requests_in_flight() {
    let server = start_api_mock().await;
    mount_posts(&server, &[1, 2, 3, 4, 5]).await;
    for post_id in 1..=5 {
        mount_comments_delayed(&server, post_id, &[post_id], Duration::from_millis(50)).await;
    }

    let output = orchestrator(
        &server,
        OrchestratorConfig {
            concurrency: ConcurrencyLimit::new(2).unwrap(),
            ..OrchestratorConfig::default()
        },
    )
    .run()
    .await
    .unwrap();

    assert_eq!(output.report.limit.get(), 2);
    // 5 requests of 50ms in waves of at most 2.
    assert!(output.report.elapsed >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_posts_failure_issues_no_comment_requests() {
    let server = start_api_mock().await;
    mount_status(&server, "/posts", 500).await;

    let run = orchestrator(&server, OrchestratorConfig::default());
    let phases = run.subscribe();
    let err = run.run().await.unwrap_err();

    assert!(matches!(err, RunError::FetchPosts(_)));
    assert_eq!(err.fetch_error().and_then(|e| e.status()), Some(500));
    assert_eq!(*phases.borrow(), RunPhase::Failed);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/posts");
}

#[tokio::test]
async fn test_comment_failure_fails_run() {
    let server = start_api_mock().await;
    mount_posts(&server, &[1, 2, 3]).await;
    mount_comments(&server, 1, &[10]).await;
    mount_status(&server, "/posts/2/comments", 404).await;
    mount_comments(&server, 3, &[30]).await;

    let err = orchestrator(&server, with_strategy(JoinStrategy::ScatterMerge))
        .run()
        .await
        .unwrap_err();

    let RunError::FetchComments { post_id, source } = &err else {
        panic!("expected comment fetch failure, got {err:?}");
    };
    assert_eq!(*post_id, PostId::new(2));
    assert_eq!(source.kind(), FetchErrorKind::HttpStatus);
    assert_eq!(source.status(), Some(404));
}

#[tokio::test]
async fn test_malformed_comments_fail_with_decode() {
    let server = start_api_mock().await;
    mount_posts(&server, &[1]).await;
    Mock::given(method("GET"))
        .and(path("/posts/1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = orchestrator(&server, OrchestratorConfig::default())
        .run()
        .await
        .unwrap_err();

    assert_eq!(
        err.fetch_error().map(|e| e.kind()),
        Some(FetchErrorKind::Decode)
    );
}

#[tokio::test]
async fn test_spawned_run_over_http() {
    let server = start_api_mock().await;
    mount_posts(&server, &[7]).await;
    mount_comments(&server, 7, &[70, 71]).await;

    let handle = orchestrator(&server, OrchestratorConfig::default()).spawn();
    let output = handle.outcome().await.unwrap();

    assert_eq!(output.report.posts, 1);
    assert_eq!(output.report.comments, 2);
}

#[tokio::test]
async fn test_enriched_json_shape() {
    let server = start_api_mock().await;
    mount_posts(&server, &[1]).await;
    mount_comments(&server, 1, &[10]).await;

    let output = orchestrator(&server, OrchestratorConfig::default())
        .run()
        .await
        .unwrap();
    let value = serde_json::to_value(&output.posts).unwrap();

    assert_eq!(value[0]["userId"], 1);
    assert_eq!(value[0]["id"], 1);
    assert_eq!(value[0]["title"], "post 1");
    assert_eq!(value[0]["comments"][0]["postId"], 1);
    assert_eq!(value[0]["comments"][0]["email"], "reader@example.com");
}
