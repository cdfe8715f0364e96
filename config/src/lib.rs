//! Configuration for postjoin.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults.
//! 2. `~/.postjoin/config.toml`, or the file named by `POSTJOIN_CONFIG`.
//! 3. `POSTJOIN_*` environment variables.
//!
//! A missing file is not an error. A file that cannot be read or parsed is,
//! and so is an override whose value does not parse.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use postjoin_fetch::FetcherConfig;
use postjoin_types::{ConcurrencyLimit, FetchMode, JoinStrategy, OrphanPolicy};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable that replaces the default config file location.
pub const CONFIG_PATH_VAR: &str = "POSTJOIN_CONFIG";

pub const BASE_URL_VAR: &str = "POSTJOIN_BASE_URL";
pub const CONCURRENCY_VAR: &str = "POSTJOIN_CONCURRENCY";
pub const JOIN_STRATEGY_VAR: &str = "POSTJOIN_JOIN_STRATEGY";
pub const MODE_VAR: &str = "POSTJOIN_MODE";
pub const OUTPUT_VAR: &str = "POSTJOIN_OUTPUT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidOverride {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// The config file involved, if the error came from one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            Self::InvalidOverride { .. } => None,
        }
    }
}

/// How the CLI renders a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON array of enriched posts.
    #[default]
    Json,
    /// One line per post plus a totals line.
    Summary,
}

impl OutputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Summary => "summary",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "summary" => Ok(Self::Summary),
            other => Err(format!("unknown output format `{other}` (expected json or summary)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw contents of config.toml. Every table is optional.
#[derive(Debug, Default, Deserialize)]
pub struct PostjoinConfig {
    pub api: Option<FetcherConfig>,
    pub run: Option<RunConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunConfig {
    pub mode: Option<FetchMode>,
    /// Maximum comment fetches in flight. Must be at least 1. Default: 4.
    pub concurrency: Option<ConcurrencyLimit>,
    pub join_strategy: Option<JoinStrategy>,
    pub orphan_policy: Option<OrphanPolicy>,
    /// Fill each comment's back-reference to its post.
    #[serde(default)]
    pub link_parents: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub fetcher: FetcherConfig,
    pub mode: FetchMode,
    pub concurrency: ConcurrencyLimit,
    pub join_strategy: JoinStrategy,
    pub orphan_policy: OrphanPolicy,
    pub link_parents: bool,
    pub output: OutputFormat,
}

/// Expand `${VAR}` references using the process environment.
///
/// Unset variables expand to the empty string. An unclosed `${` is kept
/// verbatim.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    expand_with(value, |name| env::var(name).ok())
}

fn expand_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        if !name.is_empty() {
            out.push_str(&lookup(name).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Default config location: `~/.postjoin/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".postjoin").join("config.toml"))
}

/// Config location honoring `POSTJOIN_CONFIG`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    env::var_os(CONFIG_PATH_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(default_config_path)
}

impl PostjoinConfig {
    /// Load from [`config_path`]. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        Self::parse(&content)
            .map(Some)
            .map_err(|source| {
                tracing::warn!("Failed to parse config at {:?}: {}", path, source);
                ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })
    }

    /// Parse config.toml contents and expand `${VAR}` in string values.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        if let Some(api) = config.api.as_mut() {
            api.base_url = api.base_url.as_deref().map(expand_env_vars);
            api.user_agent = api.user_agent.as_deref().map(expand_env_vars);
        }
        Ok(config)
    }

    /// Fill unset values with defaults.
    #[must_use]
    pub fn resolve(self) -> Settings {
        let run = self.run.unwrap_or_default();
        Settings {
            fetcher: self.api.unwrap_or_default(),
            mode: run.mode.unwrap_or_default(),
            concurrency: run.concurrency.unwrap_or_default(),
            join_strategy: run.join_strategy.unwrap_or_default(),
            orphan_policy: run.orphan_policy.unwrap_or_default(),
            link_parents: run.link_parents,
            output: self.output.and_then(|o| o.format).unwrap_or_default(),
        }
    }
}

impl Settings {
    /// Load the config file and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = PostjoinConfig::load()?.unwrap_or_default().resolve();
        settings.apply_overrides(|name| env::var(name).ok())?;
        Ok(settings)
    }

    /// Apply `POSTJOIN_*` overrides read through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = get(BASE_URL_VAR) {
            self.fetcher.base_url = Some(base_url);
        }
        if let Some(value) = get(CONCURRENCY_VAR) {
            self.concurrency = parse_override(CONCURRENCY_VAR, value)?;
        }
        if let Some(value) = get(JOIN_STRATEGY_VAR) {
            self.join_strategy = parse_override(JOIN_STRATEGY_VAR, value)?;
        }
        if let Some(value) = get(MODE_VAR) {
            self.mode = parse_override(MODE_VAR, value)?;
        }
        if let Some(value) = get(OUTPUT_VAR) {
            self.output = parse_override(OUTPUT_VAR, value)?;
        }
        Ok(())
    }
}

fn parse_override<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value.parse() {
        Ok(parsed) => {
            tracing::debug!(var, value = %value, "applied environment override");
            Ok(parsed)
        }
        Err(err) => Err(ConfigError::InvalidOverride {
            var,
            reason: err.to_string(),
            value,
        }),
    }
}
