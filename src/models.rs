//! Data models for configured sources, parsed feed entries and the output payload.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourcesConfig`] / [`Source`]: The run configuration, read once per run
//! - [`RawEntry`]: One feed entry as the parser saw it, before normalization
//! - [`Item`]: The canonical, normalized record written to the output
//! - [`Payload`] / [`Stats`]: The output document and its diagnostics
//!
//! Output field names are part of the contract with the page that renders
//! the digest, hence the explicit `serde` renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display label used when a source has no `name`.
pub const DEFAULT_SOURCE_NAME: &str = "Fonte";

/// Maximum number of items in the output when the config sets no `limit`.
pub const DEFAULT_ITEM_LIMIT: usize = 80;

/// The sources document.
///
/// Only `sources` is meaningful for most deployments; the other fields let a
/// deployment tune the run without rebuilding.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Maximum number of items kept after ranking.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Rank by preference score and timestamp; `false` keeps source order.
    #[serde(default = "default_true")]
    pub rank_by_preference: bool,
    /// How many sources may be in flight at once.
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Replaces the built-in blocklist when present.
    #[serde(default)]
    pub blocklist: Option<Vec<String>>,
    /// Replaces the built-in preference keywords when present.
    #[serde(default)]
    pub prefer: Option<Vec<String>>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            limit: None,
            rank_by_preference: true,
            concurrency: None,
            blocklist: None,
            prefer: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_source_name() -> String {
    DEFAULT_SOURCE_NAME.to_string()
}

/// How a source's feed URL is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `rss` is the feed URL (RSS or Atom).
    #[default]
    Rss,
    /// Google News search feed built from `query` unless `rss` is given.
    GoogleNews,
}

/// One configured feed endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    #[serde(default = "default_source_name")]
    pub name: String,
    #[serde(default, alias = "feedUrl")]
    pub rss: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub hl: Option<String>,
    #[serde(default)]
    pub gl: Option<String>,
    #[serde(default)]
    pub ceid: Option<String>,
    /// Follow item links to fill in a missing image or timestamp.
    #[serde(default)]
    pub enrich: Option<bool>,
}

impl Source {
    /// Google News sources enrich by default, plain feeds do not.
    pub fn enrich_enabled(&self) -> bool {
        self.enrich.unwrap_or(self.kind == SourceKind::GoogleNews)
    }
}

/// A feed entry as extracted by the parser, prior to normalization.
///
/// Several fields carry alternatives for the same concept; the assembler
/// decides which one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub content_encoded: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// Unparsed date strings in the order they were found.
    pub raw_dates: Vec<String>,
    pub image: Option<String>,
}

/// A normalized, filtered news record ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub published_at: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Preference keyword hits; drives ranking, not part of the output.
    #[serde(skip)]
    pub score: usize,
}

/// Items produced by one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

/// A source that contributed nothing because it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub source: String,
    #[serde(rename = "feedUrl", skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    pub error: String,
}

/// Run diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub sources: usize,
    pub items_before_limit: usize,
    pub per_source: Vec<SourceCount>,
    pub failures: Vec<Failure>,
    pub filtered_by_blocklist: usize,
    pub skipped_untitled: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The output document for one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub generated_at: String,
    pub items: Vec<Item>,
    pub stats: Stats,
}

impl Payload {
    /// Payload written when the sources document could not be used.
    pub fn degenerate(generated_at: String, error: String) -> Self {
        Self {
            generated_at,
            items: Vec::new(),
            stats: Stats {
                error: Some(error),
                ..Stats::default()
            },
        }
    }
}
