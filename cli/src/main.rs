//! postjoin CLI - binary entry point.
//!
//! # Architecture
//!
//! The binary is the composition root: it resolves [`Settings`], builds the
//! HTTP fetcher, runs one [`Orchestrator`], and renders the terminal value.
//!
//! ```text
//! main() -> Settings::load() -> HttpResourceFetcher -> Orchestrator::spawn()
//!                                                            |
//!                                                            v
//!                                        RunOutput -> render | RunError -> exit 1
//! ```
//!
//! Logs go to stderr so stdout carries only the rendered result.

mod render;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use postjoin_config::Settings;
use postjoin_engine::{Orchestrator, OrchestratorConfig, ResourceFetcher};
use postjoin_fetch::HttpResourceFetcher;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal()),
        )
        .with(env_filter)
        .init();
}

fn orchestrator_config(settings: &Settings) -> OrchestratorConfig {
    OrchestratorConfig {
        mode: settings.mode,
        concurrency: settings.concurrency,
        join_strategy: settings.join_strategy,
        orphan_policy: settings.orphan_policy,
        link_parents: settings.link_parents,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = Settings::load().context("failed to load configuration")?;
    tracing::debug!(?settings, "resolved settings");

    let fetcher = HttpResourceFetcher::new(&settings.fetcher)
        .context("failed to build HTTP client")?;
    tracing::info!(base_url = %fetcher.base_url(), "fetching from remote API");

    let fetcher: Arc<dyn ResourceFetcher> = Arc::new(fetcher);
    let handle = Orchestrator::new(fetcher, orchestrator_config(&settings)).spawn();
    let output = handle.outcome().await.context("run failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render::render(&mut out, &output, settings.output).context("failed to write output")?;
    out.flush().context("failed to flush output")?;

    Ok(())
}
