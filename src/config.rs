//! Loading the sources document.
//!
//! JSON is the default; files ending in `.yaml` or `.yml` are read as YAML.

use crate::error::ConfigError;
use crate::models::SourcesConfig;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Read and decode the sources document at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_sources(path: &Path) -> Result<SourcesConfig, ConfigError> {
    let content = match fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config = parse_sources(&content, path)?;
    info!(sources = config.sources.len(), "Loaded sources");
    Ok(config)
}

fn parse_sources(content: &str, path: &Path) -> Result<SourcesConfig, ConfigError> {
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
