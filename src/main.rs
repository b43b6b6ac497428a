//! # Feed Digest
//!
//! A batch job that pulls a configured list of RSS/Atom feeds, normalizes
//! their entries into a common item shape, drops off-topic items, ranks the
//! rest by community relevance, and writes a bounded JSON payload for a
//! static news page.
//!
//! ## Features
//!
//! - Plain RSS 2.0 and Atom feeds, plus Google News search feeds built from
//!   a query, language and region
//! - Tolerant parsing: malformed XML still yields whatever entries can be
//!   recovered
//! - Keyword blocklist (silent drop) and preference scoring (ranking)
//! - Optional article enrichment: `og:image` and publish time from the page
//! - One failing source never aborts the run; it is recorded in `stats`
//!
//! ## Usage
//!
//! ```sh
//! feed_digest -s data/news_sources.json -o data/news.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Config**: Read the sources document
//! 2. **Fetching**: Download every feed, at most `--concurrency` at a time
//! 3. **Assembly**: Parse entries, normalize, filter and score them
//! 4. **Ranking**: Order by score then recency, keep the first `limit`
//! 5. **Output**: Write the payload as pretty JSON
//!
//! | Outcome                      | Payload                    | Exit |
//! |------------------------------|----------------------------|------|
//! | Normal run                   | items + stats              | 0    |
//! | Every source failed          | empty items + failures     | 0    |
//! | Sources document unusable    | empty items + stats.error  | 0    |
//! | Output path not writable     | none                       | 1    |

use clap::Parser;
use std::error::Error;
use tracing::{info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod assembler;
mod classifier;
mod cli;
mod config;
mod error;
mod feeds;
mod fetcher;
mod models;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use fetcher::HttpFetcher;
use models::Payload;
use outputs::json;
use pipeline::RunOptions;
use utils::now_iso;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_digest starting up");

    let args = Cli::parse();
    info!(sources = %args.sources.display(), output = %args.output.display(), "Parsed CLI arguments");

    let payload = match config::load_sources(&args.sources).await {
        Ok(cfg) => {
            let opts = RunOptions::from_config(&cfg, args.concurrency);
            info!(
                sources = cfg.sources.len(),
                limit = opts.limit,
                concurrency = opts.concurrency,
                rank_by_preference = opts.rank_by_preference,
                "Starting run"
            );
            let fetcher = HttpFetcher::new()?;
            pipeline::run(&cfg.sources, &fetcher, &opts).await
        }
        Err(e) => {
            warn!(error = %e, "Sources document unusable; writing empty payload");
            Payload::degenerate(now_iso(), e.to_string())
        }
    };

    json::write_payload(&payload, &args.output).await?;
    println!(
        "Wrote {} with {} items",
        args.output.display(),
        payload.items.len()
    );

    let elapsed = start_time.elapsed();
    info!(
        items = payload.items.len(),
        failures = payload.stats.failures.len(),
        elapsed_secs = elapsed.as_secs_f64(),
        "Run complete"
    );

    Ok(())
}
