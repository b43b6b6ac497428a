//! Run orchestration: sources in, ranked [`Payload`] out.
//!
//! For every configured source, in listed order:
//! 1. **Resolve**: work out the feed URL (missing URL is a recorded failure)
//! 2. **Fetch**: one HTTP attempt via a [`FeedFetcher`]
//! 3. **Parse**: decode RSS/Atom into raw entries (never fails)
//! 4. **Assemble**: normalize, filter and identify each entry
//! 5. **Enrich** (opt-in): fill a missing image or date from the article page
//!
//! A failing source is recorded in `stats.failures` and never affects the
//! others. Sources may run concurrently, but results are merged in
//! configured order so the output does not depend on timing.

use crate::assembler::{Assembled, assemble};
use crate::classifier::Classifier;
use crate::error::SourceError;
use crate::feeds::{self, article, parser};
use crate::fetcher::FeedFetcher;
use crate::models::{
    DEFAULT_ITEM_LIMIT, Failure, Item, Payload, Source, SourceCount, SourcesConfig, Stats,
};
use crate::utils::{now_iso, truncate_for_log};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::cmp::Reverse;
use tracing::{debug, info, instrument, warn};

/// Per-run settings derived from the sources document and CLI.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub limit: usize,
    pub rank_by_preference: bool,
    pub concurrency: usize,
    pub classifier: Classifier,
}

impl RunOptions {
    /// Options from the config, with `concurrency` overridden when given.
    pub fn from_config(config: &SourcesConfig, concurrency: Option<usize>) -> Self {
        Self {
            limit: config.limit.unwrap_or(DEFAULT_ITEM_LIMIT),
            rank_by_preference: config.rank_by_preference,
            concurrency: concurrency.or(config.concurrency).unwrap_or(1).max(1),
            classifier: Classifier::from_overrides(
                config.blocklist.as_deref(),
                config.prefer.as_deref(),
            ),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&SourcesConfig::default(), None)
    }
}

/// What one source contributed.
#[derive(Debug, Default)]
struct SourceHarvest {
    items: Vec<Item>,
    blocked: usize,
    untitled: usize,
}

/// Run the whole pipeline and build the payload.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn run<F: FeedFetcher>(sources: &[Source], fetcher: &F, opts: &RunOptions) -> Payload {
    let outcomes: Vec<(&Source, Option<String>, Result<SourceHarvest, SourceError>)> =
        stream::iter(sources)
            .map(|source| async move {
                match feeds::feed_url(source) {
                    Ok(url) => {
                        let result = collect_source(source, &url, fetcher, &opts.classifier).await;
                        (source, Some(url), result)
                    }
                    Err(e) => (source, None, Err(e)),
                }
            })
            .buffered(opts.concurrency)
            .collect()
            .await;

    let mut stats = Stats {
        sources: sources.len(),
        ..Stats::default()
    };
    let mut all_items = Vec::new();

    for (source, feed_url, result) in outcomes {
        match result {
            Ok(harvest) => {
                info!(
                    source = %source.name,
                    count = harvest.items.len(),
                    blocked = harvest.blocked,
                    untitled = harvest.untitled,
                    "Collected source"
                );
                stats.per_source.push(SourceCount {
                    source: source.name.clone(),
                    count: harvest.items.len(),
                });
                stats.filtered_by_blocklist += harvest.blocked;
                stats.skipped_untitled += harvest.untitled;
                all_items.extend(harvest.items);
            }
            Err(e) => {
                warn!(source = %source.name, error = %e, "Source failed");
                stats.failures.push(Failure {
                    source: source.name.clone(),
                    feed_url,
                    error: e.to_string(),
                });
            }
        }
    }

    stats.items_before_limit = all_items.len();
    let items = rank(all_items, opts.rank_by_preference)
        .into_iter()
        .take(opts.limit)
        .collect::<Vec<_>>();

    info!(
        kept = items.len(),
        before_limit = stats.items_before_limit,
        failures = stats.failures.len(),
        "Pipeline complete"
    );

    Payload {
        generated_at: now_iso(),
        items,
        stats,
    }
}

/// Order items for display.
///
/// With preference ranking, higher scores come first and equal scores are
/// ordered by `publishedAt` ascending as plain strings, so undated items
/// lead their score group. The sort is stable. Without ranking the input
/// order is kept.
pub fn rank(items: Vec<Item>, by_preference: bool) -> Vec<Item> {
    if !by_preference {
        return items;
    }
    items
        .into_iter()
        .sorted_by(|a, b| {
            (Reverse(a.score), &a.published_at).cmp(&(Reverse(b.score), &b.published_at))
        })
        .collect()
}

#[instrument(level = "info", skip_all, fields(source = %source.name, %url))]
async fn collect_source<F: FeedFetcher>(
    source: &Source,
    url: &str,
    fetcher: &F,
    classifier: &Classifier,
) -> Result<SourceHarvest, SourceError> {
    let fetched = fetcher.fetch(url).await?;
    let entries = parser::parse_feed(&fetched.body, &source.name);

    let mut harvest = SourceHarvest::default();
    for entry in &entries {
        match assemble(entry, &source.name, classifier) {
            Assembled::Item(item) => harvest.items.push(item),
            Assembled::Blocked => {
                debug!(
                    title = %truncate_for_log(entry.title.as_deref().unwrap_or_default(), 80),
                    "Blocked entry"
                );
                harvest.blocked += 1;
            }
            Assembled::Untitled => harvest.untitled += 1,
        }
    }

    if source.enrich_enabled() {
        for item in harvest.items.iter_mut() {
            enrich_item(item, fetcher).await;
        }
    }

    Ok(harvest)
}

/// Fill a missing image or timestamp from the article page.
///
/// One attempt; any failure leaves the item unchanged. The `id` is never
/// touched, only `url` follows redirects.
async fn enrich_item<F: FeedFetcher>(item: &mut Item, fetcher: &F) {
    if item.url.is_empty() || (item.image.is_some() && !item.published_at.is_empty()) {
        return;
    }
    match fetcher.fetch(&item.url).await {
        Ok(page) => {
            let meta = article::extract_meta(&page.body, &page.url);
            if item.image.is_none() {
                item.image = meta.image;
            }
            if item.published_at.is_empty() {
                item.published_at = meta.published_at.unwrap_or_default();
            }
            item.url = page.url;
        }
        Err(e) => debug!(url = %item.url, error = %e, "Enrichment fetch failed"),
    }
}
