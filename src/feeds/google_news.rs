//! Google News search feeds.
//!
//! Google News publishes an RSS endpoint per search query. Sources of type
//! `google_news` may give the query and locale instead of a full feed URL.

use crate::error::SourceError;
use crate::models::Source;

const SEARCH_ENDPOINT: &str = "https://news.google.com/rss/search";

const DEFAULT_HL: &str = "pt-BR";
const DEFAULT_GL: &str = "BR";
const DEFAULT_CEID: &str = "BR:pt-419";

/// Build the search feed URL for `query` in the given locale.
pub fn search_url(query: &str, hl: &str, gl: &str, ceid: &str) -> String {
    format!(
        "{SEARCH_ENDPOINT}?q={}&hl={}&gl={}&ceid={}",
        urlencoding::encode(query),
        urlencoding::encode(hl),
        urlencoding::encode(gl),
        urlencoding::encode(ceid),
    )
}

/// Feed URL for a `google_news` source: explicit `rss` first, then the query.
pub fn feed_url(source: &Source) -> Result<String, SourceError> {
    if let Some(rss) = source.rss.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(rss.to_string());
    }
    let query = source
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(SourceError::MissingQuery)?;
    Ok(search_url(
        query,
        source.hl.as_deref().unwrap_or(DEFAULT_HL),
        source.gl.as_deref().unwrap_or(DEFAULT_GL),
        source.ceid.as_deref().unwrap_or(DEFAULT_CEID),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(json: &str) -> Source {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_search_url_encodes_query_and_locale() {
        assert_eq!(
            search_url("feira de saúde", "pt-BR", "BR", "BR:pt-419"),
            "https://news.google.com/rss/search?q=feira%20de%20sa%C3%BAde&hl=pt-BR&gl=BR&ceid=BR%3Apt-419"
        );
    }

    #[test]
    fn test_feed_url_uses_defaults() {
        let s = source(r#"{"type":"google_news","query":"mutirão"}"#);
        assert_eq!(
            feed_url(&s).unwrap(),
            "https://news.google.com/rss/search?q=mutir%C3%A3o&hl=pt-BR&gl=BR&ceid=BR%3Apt-419"
        );
    }

    #[test]
    fn test_explicit_rss_wins() {
        let s = source(r#"{"type":"google_news","rss":"http://x/feed","query":"ignored"}"#);
        assert_eq!(feed_url(&s).unwrap(), "http://x/feed");
    }

    #[test]
    fn test_missing_query_is_an_error() {
        let s = source(r#"{"type":"google_news","query":"  "}"#);
        assert!(matches!(feed_url(&s), Err(SourceError::MissingQuery)));
    }
}
