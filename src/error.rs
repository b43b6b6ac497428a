//! Error types for configuration loading and per-source collection.
//!
//! Neither error is fatal to a run: a [`ConfigError`] produces a degenerate
//! payload and a [`SourceError`] is recorded in `stats.failures`.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain the list of sources.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failure isolated to one configured source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("missing rss url")]
    MissingUrl,

    #[error("missing rss/query url")]
    MissingQuery,

    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
