//! Utility functions for text normalization, hashing and timestamps.
//!
//! This module provides helper functions used throughout the application:
//! - Markup stripping and whitespace collapsing for feed text
//! - Summary truncation with an ellipsis marker
//! - A process-stable digest for item identifiers
//! - Timestamp parsing and ISO-8601 UTC formatting

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Display length for summaries, in characters.
pub const SUMMARY_LIMIT: usize = 220;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

// Repairs for dates that are almost RFC 2822.
static RE_WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Sun|Mon|Tue|Wed|Thu|Fri|Sat)[a-z]*,\s*").expect("valid weekday regex")
});
static RE_LONG_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]+\b")
        .expect("valid month regex")
});
static RE_UTC_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s(?:UTC|Z|-0000)$").expect("valid zone regex"));
static RE_SHORT_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" (\d):").expect("valid hour regex"));

/// Decode entities, strip markup and collapse whitespace.
///
/// HTML entities (`&amp;`, `&nbsp;`, `&#8230;`) are decoded first, so
/// escaped markup is stripped too. Every `<...>` run becomes a space, every whitespace run (newlines and
/// tabs included) becomes a single space, and the result is trimmed.
/// Idempotent for text that is not double-escaped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_text("<p>Feira\n\tde <b>livros</b></p>"), "Feira de livros");
/// ```
pub fn normalize_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let without_tags = RE_TAGS.replace_all(&decoded, " ");
    RE_WS.replace_all(&without_tags, " ").trim().to_string()
}

/// Truncate `text` to at most `limit` characters, marking the cut with `…`.
///
/// Text that already fits is returned unchanged. Otherwise the first `limit`
/// characters are kept, trailing whitespace is trimmed and a single `…` is
/// appended, so the result never exceeds `limit + 1` characters.
pub fn truncate_summary(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let head: String = text.chars().take(limit).collect();
    format!("{}…", head.trim_end())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary near `max` bytes with an
/// ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Deterministic digest of `input`, rendered as a decimal string.
///
/// The first eight bytes of SHA-256 over the UTF-8 bytes, read as a
/// big-endian `u64`. Identical across runs, processes and machines.
pub fn stable_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head).to_string()
}

/// Render a UTC instant as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time in the output timestamp format.
pub fn now_iso() -> String {
    to_iso(&Utc::now())
}

/// Parse a feed or page date string into UTC.
///
/// Accepts RFC 2822 (`pubDate`), RFC 3339 (Atom), naive date-times and bare
/// dates. Values without a zone are taken as UTC; a bare date is midnight.
/// Common RFC 2822 deviations are repaired first: wrong or long weekday
/// names, long month names, `UTC`/`Z` zones and single-digit hours.
///
/// This is also the timestamp parser handed to `feed-rs`, so feed dates and
/// page dates follow the same rules.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&repair_rfc2822(s)) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn repair_rfc2822(s: &str) -> String {
    let s = RE_WEEKDAY.replace(s, "");
    let s = RE_LONG_MONTH.replace_all(&s, "$1");
    let s = RE_UTC_SUFFIX.replace(&s, " +0000");
    RE_SHORT_HOUR.replace(&s, " 0${1}:").into_owned()
}
