//! Core engine for postjoin: bounded fetching, joins, and run orchestration.
//!
//! This crate has no knowledge of HTTP. It drives any
//! [`ResourceFetcher`] through a run and hands back one terminal value.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::must_use_candidate)] // Not all return values need must_use annotation

mod bounded;
mod join;
mod orchestrator;
mod state;

pub use bounded::{BoundedMapper, Indexed};
pub use join::{JoinError, Orphan, attach_inline, find_orphans, link_parents, scatter_merge};
pub use orchestrator::{
    Orchestrator, OrchestratorConfig, RunError, RunHandle, RunOutput, RunReport, RunResult,
};
pub use state::{IllegalTransition, RunEdge, RunPhase, transition_edge};

pub use postjoin_fetch::{FetchError, FetchErrorKind, ResourceFetcher};
pub use postjoin_types::{
    Comment, CommentId, ConcurrencyLimit, EnrichedPost, FetchMode, JoinStrategy, OrphanPolicy,
    Post, PostId, UserId,
};
