//! Run state machine and its transition graph.
//!
//! This module is the single encoding point for which phase may follow
//! which. The orchestrator asks [`transition_edge`] before every move and
//! refuses edges that are not in the graph.
//!
//! ```text
//! Idle -> FetchingPosts -> FetchingComments -> Joining -> Complete
//!                                  |                        ^
//!                                  +------(inline)----------+
//!
//! FetchingPosts | FetchingComments | Joining -> Failed
//! ```

use std::fmt;

/// Observable phase of one orchestration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RunPhase {
    #[default]
    Idle,
    FetchingPosts,
    FetchingComments,
    Joining,
    Complete,
    Failed,
}

impl RunPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingPosts => "fetching_posts",
            Self::FetchingComments => "fetching_comments",
            Self::Joining => "joining",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named edges of the run graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunEdge {
    Start,
    PostsFetched,
    /// Inline join: comments arrive already attached.
    CommentsJoinedInline,
    /// Scatter/merge: comments arrive unattached and must be joined.
    CommentsCollected,
    Joined,
    Fail,
}

#[must_use]
pub fn transition_edge(from: RunPhase, to: RunPhase) -> Option<RunEdge> {
    use RunEdge::{CommentsCollected, CommentsJoinedInline, Fail, Joined, PostsFetched, Start};
    use RunPhase::{Complete, Failed, FetchingComments, FetchingPosts, Idle, Joining};

    match (from, to) {
        (Idle, FetchingPosts) => Some(Start),
        (FetchingPosts, FetchingComments) => Some(PostsFetched),
        (FetchingComments, Complete) => Some(CommentsJoinedInline),
        (FetchingComments, Joining) => Some(CommentsCollected),
        (Joining, Complete) => Some(Joined),
        (FetchingPosts | FetchingComments | Joining, Failed) => Some(Fail),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal run transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: RunPhase,
    pub to: RunPhase,
}

/// Current phase plus the history of edges taken.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunMachine {
    phase: RunPhase,
    edges: Vec<RunEdge>,
}

impl RunMachine {
    pub(crate) fn phase(&self) -> RunPhase {
        self.phase
    }

    pub(crate) fn edges(&self) -> &[RunEdge] {
        &self.edges
    }

    pub(crate) fn advance(&mut self, to: RunPhase) -> Result<RunEdge, IllegalTransition> {
        let from = self.phase;
        let edge = transition_edge(from, to).ok_or(IllegalTransition { from, to })?;
        self.phase = to;
        self.edges.push(edge);
        Ok(edge)
    }
}
