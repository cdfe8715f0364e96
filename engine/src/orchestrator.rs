//! Fetch-and-join orchestration for one run.
//!
//! An [`Orchestrator`] drives a single run through the [`RunPhase`] graph:
//! fetch the posts once, fetch every post's comments through a
//! [`BoundedMapper`], join, and deliver exactly one terminal value. The
//! orchestrator is consumed by [`Orchestrator::run`]; a second run needs a
//! new orchestrator.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use postjoin_fetch::{FetchError, ResourceFetcher};
use postjoin_types::{
    Comment, ConcurrencyLimit, EnrichedPost, FetchMode, JoinStrategy, OrphanPolicy, Post, PostId,
};
use thiserror::Error;
use tokio::sync::{oneshot, watch};

use crate::bounded::{BoundedMapper, Indexed};
use crate::join::{self, JoinError};
use crate::state::{RunMachine, RunPhase};

/// Resolved settings for one orchestration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub mode: FetchMode,
    pub concurrency: ConcurrencyLimit,
    pub join_strategy: JoinStrategy,
    pub orphan_policy: OrphanPolicy,
    /// Fill each attached comment's `post` back-reference.
    pub link_parents: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("failed to fetch posts: {0}")]
    FetchPosts(#[source] FetchError),

    #[error("failed to fetch comments for post {post_id}: {source}")]
    FetchComments {
        post_id: PostId,
        #[source]
        source: FetchError,
    },

    #[error("failed to join comments: {0}")]
    Join(#[from] JoinError),

    #[error("run ended without delivering a result")]
    Aborted,
}

impl RunError {
    /// The fetch failure behind this error, if any.
    #[must_use]
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::FetchPosts(source) | Self::FetchComments { source, .. } => Some(source),
            Self::Join(_) | Self::Aborted => None,
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub posts: usize,
    pub comments: usize,
    pub strategy: JoinStrategy,
    pub mode: FetchMode,
    pub limit: ConcurrencyLimit,
    pub elapsed: Duration,
}

/// Terminal success value: every post with its comments, in post order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub posts: Vec<EnrichedPost>,
    pub report: RunReport,
}

pub type RunResult = Result<RunOutput, RunError>;

pub struct Orchestrator {
    fetcher: Arc<dyn ResourceFetcher>,
    config: OrchestratorConfig,
    machine: RunMachine,
    phase_tx: watch::Sender<RunPhase>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("phase", &self.machine.phase())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, config: OrchestratorConfig) -> Self {
        let (phase_tx, _) = watch::channel(RunPhase::Idle);
        Self {
            fetcher,
            config,
            machine: RunMachine::default(),
            phase_tx,
        }
    }

    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.machine.phase()
    }

    /// Observe phase changes. The receiver sees the latest phase, ending in
    /// `Complete` or `Failed`.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunPhase> {
        self.phase_tx.subscribe()
    }

    /// Run on a tokio task and return a handle that yields the outcome once.
    #[must_use]
    pub fn spawn(self) -> RunHandle {
        let phases = self.subscribe();
        let (result_tx, result_rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = self.run().await;
            if result_tx.send(outcome).is_err() {
                tracing::debug!("run handle dropped before the outcome was delivered");
            }
        });
        RunHandle {
            phases,
            result: result_rx,
        }
    }

    /// Execute the run to a terminal phase.
    pub async fn run(mut self) -> RunResult {
        let started = Instant::now();
        tracing::info!(
            strategy = %self.config.join_strategy,
            mode = %self.config.mode,
            concurrency = %self.config.concurrency,
            "starting run"
        );

        match self.execute().await {
            Ok((posts, limit)) => {
                self.advance(RunPhase::Complete);
                let report = RunReport {
                    posts: posts.len(),
                    comments: posts.iter().map(|p| p.comments.len()).sum(),
                    strategy: self.config.join_strategy,
                    mode: self.config.mode,
                    limit,
                    elapsed: started.elapsed(),
                };
                tracing::info!(
                    posts = report.posts,
                    comments = report.comments,
                    elapsed_ms = report.elapsed.as_millis(),
                    "run complete"
                );
                tracing::debug!(edges = ?self.machine.edges(), "run path");
                Ok(RunOutput { posts, report })
            }
            Err(err) => {
                self.advance(RunPhase::Failed);
                tracing::warn!(error = %err, "run failed");
                tracing::debug!(edges = ?self.machine.edges(), "run path");
                Err(err)
            }
        }
    }

    async fn execute(&mut self) -> Result<(Vec<EnrichedPost>, ConcurrencyLimit), RunError> {
        self.advance(RunPhase::FetchingPosts);
        let posts = self
            .fetcher
            .fetch_posts()
            .await
            .map_err(RunError::FetchPosts)?;
        tracing::info!(count = posts.len(), "fetched posts");

        let limit = self.config.mode.limit_for(self.config.concurrency, posts.len());
        tracing::info!(
            posts = posts.len(),
            limit = limit.get(),
            mode = %self.config.mode,
            "fetching comments"
        );
        self.advance(RunPhase::FetchingComments);

        let mut enriched = match self.config.join_strategy {
            JoinStrategy::Inline => self.fetch_inline(posts, limit).await?,
            JoinStrategy::ScatterMerge => {
                let collections = self.fetch_collections(&posts, limit).await?;
                self.advance(RunPhase::Joining);
                join::scatter_merge(&posts, &collections, self.config.orphan_policy)?
            }
        };

        if self.config.link_parents {
            join::link_parents(&mut enriched);
        }
        Ok((enriched, limit))
    }

    /// Fetch and attach in one step per post; results come back in post order.
    async fn fetch_inline(
        &self,
        posts: Vec<Post>,
        limit: ConcurrencyLimit,
    ) -> Result<Vec<EnrichedPost>, RunError> {
        let fetcher = Arc::clone(&self.fetcher);
        let policy = self.config.orphan_policy;

        let mapped = BoundedMapper::new(limit)
            .run(posts, move |post: Post| {
                let fetcher = Arc::clone(&fetcher);
                async move {
                    let comments = fetch_comments_of(fetcher.as_ref(), post.id).await?;
                    Ok::<_, RunError>(join::attach_inline(post, comments, policy)?)
                }
            })
            .await?;

        Ok(in_input_order(mapped))
    }

    /// Fetch every post's comments without attaching them. Collections are
    /// returned in completion order.
    async fn fetch_collections(
        &self,
        posts: &[Post],
        limit: ConcurrencyLimit,
    ) -> Result<Vec<Vec<Comment>>, RunError> {
        let fetcher = Arc::clone(&self.fetcher);
        let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();

        let mapped = BoundedMapper::new(limit)
            .run(ids, move |post_id| {
                let fetcher = Arc::clone(&fetcher);
                async move { fetch_comments_of(fetcher.as_ref(), post_id).await }
            })
            .await?;

        Ok(mapped.into_iter().map(|done| done.value).collect())
    }

    fn advance(&mut self, to: RunPhase) {
        match self.machine.advance(to) {
            Ok(edge) => {
                tracing::debug!(phase = %to, ?edge, "run transition");
                self.phase_tx.send_replace(to);
            }
            Err(err) => {
                tracing::error!(error = %err, "rejected run transition");
                debug_assert!(false, "{err}");
            }
        }
    }
}

async fn fetch_comments_of(
    fetcher: &dyn ResourceFetcher,
    post_id: PostId,
) -> Result<Vec<Comment>, RunError> {
    let comments = fetcher
        .fetch_comments(post_id)
        .await
        .map_err(|source| RunError::FetchComments { post_id, source })?;
    tracing::debug!(%post_id, count = comments.len(), "fetched comments");
    Ok(comments)
}

fn in_input_order<R>(mut mapped: Vec<Indexed<R>>) -> Vec<R> {
    mapped.sort_unstable_by_key(|done| done.index);
    mapped.into_iter().map(|done| done.value).collect()
}

/// Subscribe-once handle to a spawned run.
#[derive(Debug)]
pub struct RunHandle {
    phases: watch::Receiver<RunPhase>,
    result: oneshot::Receiver<RunResult>,
}

impl RunHandle {
    /// Latest observed phase.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        *self.phases.borrow()
    }

    /// A receiver for following phase changes.
    #[must_use]
    pub fn phases(&self) -> watch::Receiver<RunPhase> {
        self.phases.clone()
    }

    /// Wait for the terminal value. Consumes the handle.
    pub async fn outcome(self) -> RunResult {
        self.result.await.unwrap_or(Err(RunError::Aborted))
    }
}
