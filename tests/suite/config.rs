//! Config file to fetcher wiring.

use std::fs;

use postjoin_config::{OutputFormat, PostjoinConfig};
use postjoin_fetch::{HttpResourceFetcher, ResourceFetcher};
use postjoin_types::{FetchMode, JoinStrategy};

use crate::common::{mount_posts, start_api_mock};

#[tokio::test]
async fn test_config_file_points_fetcher_at_server() {
    let server = start_api_mock().await;
    mount_posts(&server, &[1, 2, 3]).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        format!(
            "[api]\nbase_url = \"{}\"\ntimeout_seconds = 5\n\n[run]\njoin_strategy = \"scatter_merge\"\n\n[output]\nformat = \"summary\"\n",
            server.uri()
        ),
    )
    .unwrap();

    let settings = PostjoinConfig::load_from(&path)
        .unwrap()
        .expect("config file exists")
        .resolve();
    assert_eq!(settings.join_strategy, JoinStrategy::ScatterMerge);
    assert_eq!(settings.mode, FetchMode::Bounded);
    assert_eq!(settings.output, OutputFormat::Summary);

    let fetcher = HttpResourceFetcher::new(&settings.fetcher).unwrap();
    let posts = fetcher.fetch_posts().await.unwrap();
    assert_eq!(posts.len(), 3);
}
