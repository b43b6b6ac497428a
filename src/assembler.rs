//! Turns parser output into canonical [`Item`] records.
//!
//! Each canonical field that has alternatives in [`RawEntry`] is resolved
//! through an ordered table of candidate extractors; the first one that
//! yields a usable value wins.
//!
//! | Field | Candidates, in order |
//! |-------|----------------------|
//! | summary | `summary`, `description`, `content:encoded` |
//! | publishedAt | structured `published`, structured `updated`, raw date strings |

use crate::classifier::Classifier;
use crate::models::{Item, RawEntry};
use crate::utils::{
    SUMMARY_LIMIT, normalize_text, parse_timestamp, stable_hash, to_iso, truncate_summary,
};

type TextCandidate = fn(&RawEntry) -> Option<&str>;
type TimeCandidate = fn(&RawEntry) -> Option<String>;

/// Summary sources; `content:encoded` only as a last resort.
pub const SUMMARY_CANDIDATES: &[(&str, TextCandidate)] = &[
    ("summary", summary_field),
    ("description", description_field),
    ("content:encoded", content_encoded_field),
];

/// Timestamp sources; structured values before raw strings.
pub const PUBLISHED_CANDIDATES: &[(&str, TimeCandidate)] = &[
    ("published", published_field),
    ("updated", updated_field),
    ("raw_dates", raw_dates_field),
];

fn summary_field(e: &RawEntry) -> Option<&str> {
    e.summary.as_deref()
}

fn description_field(e: &RawEntry) -> Option<&str> {
    e.description.as_deref()
}

fn content_encoded_field(e: &RawEntry) -> Option<&str> {
    e.content_encoded.as_deref()
}

fn published_field(e: &RawEntry) -> Option<String> {
    e.published.as_ref().map(to_iso)
}

fn updated_field(e: &RawEntry) -> Option<String> {
    e.updated.as_ref().map(to_iso)
}

fn raw_dates_field(e: &RawEntry) -> Option<String> {
    e.raw_dates
        .iter()
        .find_map(|raw| parse_timestamp(raw))
        .map(|dt| to_iso(&dt))
}

/// Result of assembling one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    Item(Item),
    /// Title empty after normalization.
    Untitled,
    /// Matched the blocklist.
    Blocked,
}

/// Normalized summary, before truncation.
pub fn resolve_summary(entry: &RawEntry) -> String {
    SUMMARY_CANDIDATES
        .iter()
        .filter_map(|(_, pick)| pick(entry))
        .map(normalize_text)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// ISO-8601 UTC timestamp, or empty when none can be obtained.
pub fn resolve_published(entry: &RawEntry) -> String {
    PUBLISHED_CANDIDATES
        .iter()
        .find_map(|(_, pick)| pick(entry))
        .unwrap_or_default()
}

/// Build an [`Item`] from a raw entry, or say why it was skipped.
pub fn assemble(entry: &RawEntry, source_name: &str, classifier: &Classifier) -> Assembled {
    let title = normalize_text(entry.title.as_deref().unwrap_or_default());
    if title.is_empty() {
        return Assembled::Untitled;
    }

    let summary = truncate_summary(&resolve_summary(entry), SUMMARY_LIMIT);
    if classifier.is_blocked(&title, &summary) {
        return Assembled::Blocked;
    }

    let url = entry
        .link
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let id_basis = if url.is_empty() { title.as_str() } else { url.as_str() };

    Assembled::Item(Item {
        id: format!("{source_name}:{}", stable_hash(id_basis)),
        score: classifier.preference_score(&title, &summary),
        published_at: resolve_published(entry),
        image: entry.image.clone(),
        source: source_name.to_string(),
        title,
        summary,
        url,
    })
}
