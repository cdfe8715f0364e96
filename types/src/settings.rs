//! Resolved run settings shared across crates.
//!
//! Raw TOML structs (with `Option` fields) stay in `postjoin-config`. The
//! config loader resolves them into these types at the parse boundary, so
//! holding a value is the proof of its validity.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingParseError {
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,
    #[error("invalid concurrency limit `{0}`")]
    InvalidConcurrency(String),
    #[error("unknown join strategy `{0}` (expected `inline` or `scatter_merge`)")]
    UnknownJoinStrategy(String),
    #[error("unknown orphan policy `{0}` (expected `ignore` or `error`)")]
    UnknownOrphanPolicy(String),
    #[error("unknown fetch mode `{0}` (expected `bounded`, `serial` or `parallel`)")]
    UnknownFetchMode(String),
}

/// Maximum number of operations in flight at once.
///
/// Invariant: never zero (enforced through `NonZeroUsize` and
/// `#[serde(try_from)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ConcurrencyLimit(NonZeroUsize);

impl ConcurrencyLimit {
    pub const DEFAULT: Self = Self(NonZeroUsize::new(4).expect("4 is non-zero"));
    pub const SERIAL: Self = Self(NonZeroUsize::MIN);

    pub fn new(limit: usize) -> Result<Self, SettingParseError> {
        NonZeroUsize::new(limit)
            .map(Self)
            .ok_or(SettingParseError::ZeroConcurrency)
    }

    /// A limit that admits all `total` items at once.
    ///
    /// An empty input still gets a limit of one; nothing is ever admitted.
    #[must_use]
    pub fn unbounded_for(total: usize) -> Self {
        NonZeroUsize::new(total).map_or(Self::SERIAL, Self)
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for ConcurrencyLimit {
    type Error = SettingParseError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConcurrencyLimit> for usize {
    fn from(value: ConcurrencyLimit) -> Self {
        value.get()
    }
}

impl FromStr for ConcurrencyLimit {
    type Err = SettingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s
            .trim()
            .parse::<usize>()
            .map_err(|_| SettingParseError::InvalidConcurrency(s.to_string()))?;
        Self::new(parsed)
    }
}

impl fmt::Display for ConcurrencyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// How comments are joined onto their posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// Each child fetch attaches its comments to the post it was issued for.
    #[default]
    Inline,
    /// Posts and comment collections are fetched independently, then matched
    /// by `post_id`.
    ScatterMerge,
}

impl JoinStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::ScatterMerge => "scatter_merge",
        }
    }
}

impl FromStr for JoinStrategy {
    type Err = SettingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "scatter_merge" | "scatter-merge" | "scattermerge" => Ok(Self::ScatterMerge),
            _ => Err(SettingParseError::UnknownJoinStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// What to do with a comment whose `post_id` does not match its post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Drop (scatter/merge) or keep as fetched (inline), without failing.
    #[default]
    Ignore,
    /// Fail the join.
    Error,
}

impl OrphanPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Error => "error",
        }
    }
}

impl FromStr for OrphanPolicy {
    type Err = SettingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "error" => Ok(Self::Error),
            _ => Err(SettingParseError::UnknownOrphanPolicy(s.to_string())),
        }
    }
}

/// Scheduling mode for the per-post comment fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// At most `concurrency` fetches in flight.
    #[default]
    Bounded,
    /// One fetch at a time, in post order.
    Serial,
    /// Every fetch started at once.
    Parallel,
}

impl FetchMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bounded => "bounded",
            Self::Serial => "serial",
            Self::Parallel => "parallel",
        }
    }

    /// Resolve the effective limit for `total` items.
    #[must_use]
    pub fn limit_for(self, configured: ConcurrencyLimit, total: usize) -> ConcurrencyLimit {
        match self {
            Self::Bounded => configured,
            Self::Serial => ConcurrencyLimit::SERIAL,
            Self::Parallel => ConcurrencyLimit::unbounded_for(total),
        }
    }
}

impl FromStr for FetchMode {
    type Err = SettingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bounded" => Ok(Self::Bounded),
            "serial" => Ok(Self::Serial),
            "parallel" => Ok(Self::Parallel),
            _ => Err(SettingParseError::UnknownFetchMode(s.to_string())),
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
