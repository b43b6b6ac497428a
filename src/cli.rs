//! Command-line interface definitions for Feed Digest.
//!
//! Every option has a default, so the usual scheduled invocation takes no
//! arguments at all. Paths can also come from environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Feed Digest batch job.
///
/// # Examples
///
/// ```sh
/// # Defaults: data/news_sources.json -> data/news.json
/// feed_digest
///
/// # Explicit paths, four feeds in flight
/// feed_digest -s config/sources.yaml -o public/news.json -c 4
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Sources document (JSON, or YAML by extension)
    #[arg(short, long, env = "NEWS_SOURCES_PATH", default_value = "data/news_sources.json")]
    pub sources: PathBuf,

    /// Where to write the JSON payload
    #[arg(short, long, env = "NEWS_OUTPUT_PATH", default_value = "data/news.json")]
    pub output: PathBuf,

    /// Number of sources fetched at once (overrides the sources document)
    #[arg(short, long)]
    pub concurrency: Option<usize>,
}
