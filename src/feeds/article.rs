//! Article page metadata used to fill gaps left by the feed.
//!
//! Aggregator feeds (Google News in particular) often carry neither an image
//! nor a usable date. The publisher's page usually does, in Open Graph or
//! Twitter card `<meta>` tags or a `<time datetime>` element.

use crate::utils::{parse_timestamp, to_iso};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

/// Metadata scraped from an article page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleMeta {
    /// Absolute image URL.
    pub image: Option<String>,
    /// ISO-8601 UTC timestamp.
    pub published_at: Option<String>,
}

static IMAGE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        r#"meta[property="og:image"]"#,
        r#"meta[name="og:image"]"#,
        r#"meta[name="twitter:image"]"#,
        r#"meta[property="twitter:image"]"#,
    ])
});

static DATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        r#"meta[property="article:published_time"]"#,
        r#"meta[name="article:published_time"]"#,
        r#"meta[property="og:updated_time"]"#,
        r#"meta[name="og:updated_time"]"#,
    ])
});

static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("valid time selector"));

fn selectors(sources: &[&str]) -> Vec<Selector> {
    sources
        .iter()
        .map(|s| Selector::parse(s).expect("valid meta selector"))
        .collect()
}

/// Extract image and publication time from an article's HTML.
///
/// `page_url` is the URL the page was served from and resolves relative
/// image paths.
pub fn extract_meta(html: &str, page_url: &str) -> ArticleMeta {
    let document = Html::parse_document(html);

    let image = first_content(&document, &IMAGE_SELECTORS).and_then(|src| absolutize(&src, page_url));

    let published_at = first_content(&document, &DATE_SELECTORS)
        .into_iter()
        .chain(
            document
                .select(&TIME_SELECTOR)
                .filter_map(|el| el.value().attr("datetime"))
                .map(str::to_string),
        )
        .find_map(|raw| parse_timestamp(&raw))
        .map(|dt| to_iso(&dt));

    ArticleMeta {
        image,
        published_at,
    }
}

fn first_content(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        document
            .select(sel)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|c| !c.is_empty())
            .map(str::to_string)
    })
}

fn absolutize(src: &str, page_url: &str) -> Option<String> {
    match Url::parse(src) {
        Ok(u) => Some(u.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(page_url)
            .and_then(|base| base.join(src))
            .ok()
            .map(|u| u.to_string()),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_open_graph_tags() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://cdn.x/capa.jpg">
            <meta property="article:published_time" content="2025-05-06T09:30:00-03:00">
            </head><body></body></html>"#;
        let meta = extract_meta(html, "https://x/noticia");
        assert_eq!(meta.image.as_deref(), Some("https://cdn.x/capa.jpg"));
        assert_eq!(meta.published_at.as_deref(), Some("2025-05-06T12:30:00Z"));
    }

    #[test]
    fn test_falls_back_to_twitter_and_time_element() {
        let html = r#"<html><head>
            <meta name="twitter:image" content="/img/t.png">
            </head><body><time datetime="2025-05-06">6 de maio</time></body></html>"#;
        let meta = extract_meta(html, "https://x/a/b");
        assert_eq!(meta.image.as_deref(), Some("https://x/img/t.png"));
        assert_eq!(meta.published_at.as_deref(), Some("2025-05-06T00:00:00Z"));
    }

    #[test]
    fn test_unparseable_date_is_skipped() {
        let html = r#"<meta property="article:published_time" content="ontem">
            <time datetime="2025-05-06T08:00:00Z"></time>"#;
        let meta = extract_meta(html, "https://x/");
        assert_eq!(meta.published_at.as_deref(), Some("2025-05-06T08:00:00Z"));
    }

    #[test]
    fn test_page_without_metadata() {
        assert_eq!(extract_meta("<p>texto</p>", "https://x/"), ArticleMeta::default());
    }
}
