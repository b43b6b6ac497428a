//! Feed sources, decoding and article enrichment.
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`parser`] | RSS/Atom bytes to [`RawEntry`](crate::models::RawEntry) values |
//! | [`google_news`] | Feed URLs for Google News search sources |
//! | [`article`] | Open Graph image and date from publisher pages |
//!
//! [`feed_url`] resolves which URL a configured source is fetched from.

pub mod article;
pub mod google_news;
pub mod parser;

use crate::error::SourceError;
use crate::models::{Source, SourceKind};

/// Feed URL for a configured source.
pub fn feed_url(source: &Source) -> Result<String, SourceError> {
    match source.kind {
        SourceKind::Rss => source
            .rss
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .ok_or(SourceError::MissingUrl),
        SourceKind::GoogleNews => google_news::feed_url(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rss_source_requires_url() {
        let s: Source = serde_json::from_str(r#"{"name":"Cidade","rss":"  "}"#).unwrap();
        assert!(matches!(feed_url(&s), Err(SourceError::MissingUrl)));

        let s: Source = serde_json::from_str(r#"{"name":"Cidade","rss":"http://x/feed"}"#).unwrap();
        assert_eq!(feed_url(&s).unwrap(), "http://x/feed");
    }
}
