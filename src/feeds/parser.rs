//! Feed decoding into [`RawEntry`] values.
//!
//! Documents are first handed to `feed-rs`, which understands RSS 0.9x/1.0/2.0,
//! Atom and JSON Feed along with the Media RSS extensions. Feeds that
//! `feed-rs` rejects (broken markup, stray entities, truncated bodies) go
//! through a tag-extraction fallback that scans `<item>` or `<entry>` blocks
//! with non-greedy regexes. Neither path returns an error: a document nothing
//! can be salvaged from yields zero entries.

use crate::models::RawEntry;
use crate::utils::parse_timestamp;
use feed_rs::model::Entry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Tags read by the fallback extractor.
const FALLBACK_TAGS: &[&str] = &[
    "title",
    "link",
    "description",
    "summary",
    "content",
    "content:encoded",
    "pubDate",
    "published",
    "updated",
    "dc:date",
];

/// Date tags in priority order.
const DATE_TAGS: &[&str] = &["pubDate", "published", "updated", "dc:date"];

static TAG_RES: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    FALLBACK_TAGS
        .iter()
        .map(|tag| {
            let t = regex::escape(tag);
            let re = Regex::new(&format!(r"(?is)<{t}(?:\s[^>]*)?>(.*?)</{t}\s*>"))
                .expect("valid tag regex");
            (*tag, re)
        })
        .collect()
});

static RE_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<item\b[^>]*>.*?</item\s*>").expect("valid item regex"));
static RE_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<entry\b[^>]*>.*?</entry\s*>").expect("valid entry regex"));
static RE_ATOM_FEED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<feed[\s>]").expect("valid feed regex"));
static RE_CDATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid cdata regex"));

static RE_LINK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("valid link regex"));
static RE_MEDIA_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<media:content\b[^>]*>").expect("valid media regex"));
static RE_MEDIA_THUMBNAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<media:thumbnail\b[^>]*>").expect("valid thumbnail regex"));
static RE_ENCLOSURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<enclosure\b[^>]*>").expect("valid enclosure regex"));
static RE_IMG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid img regex"));

static RE_HREF: Lazy<Regex> = Lazy::new(|| attr_regex("href"));
static RE_URL: Lazy<Regex> = Lazy::new(|| attr_regex("url"));
static RE_SRC: Lazy<Regex> = Lazy::new(|| attr_regex("src"));
static RE_TYPE: Lazy<Regex> = Lazy::new(|| attr_regex("type"));
static RE_REL: Lazy<Regex> = Lazy::new(|| attr_regex("rel"));

fn attr_regex(name: &str) -> Regex {
    Regex::new(&format!(r#"(?i)\s{name}\s*=\s*(?:"([^"]*)"|'([^']*)')"#)).expect("valid attr regex")
}

fn attr(re: &Regex, tag: &str) -> Option<String> {
    let caps = re.captures(tag)?;
    let value = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
    (!value.is_empty()).then(|| html_escape::decode_html_entities(value).into_owned())
}

/// Decode a feed body into raw entries.
///
/// Never fails; an undecodable document yields an empty vector.
#[instrument(level = "info", skip_all, fields(source = %source_name))]
pub fn parse_feed(body: &str, source_name: &str) -> Vec<RawEntry> {
    let feed_parser = feed_rs::parser::Builder::new()
        .timestamp_parser(parse_timestamp)
        .build();
    match feed_parser.parse(body.as_bytes()) {
        Ok(feed) => {
            let entries: Vec<RawEntry> = feed.entries.into_iter().map(from_feed_rs).collect();
            debug!(count = entries.len(), "Parsed feed");
            entries
        }
        Err(e) => {
            let entries = parse_fallback(body);
            warn!(
                error = %e,
                salvaged = entries.len(),
                "Feed parser rejected document; used tag extraction"
            );
            entries
        }
    }
}

fn from_feed_rs(entry: Entry) -> RawEntry {
    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|r| r.eq_ignore_ascii_case("alternate")))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|h| !h.is_empty());

    let mut media = Vec::new();
    for object in &entry.media {
        for content in &object.content {
            let is_image = content
                .content_type
                .as_ref()
                .is_none_or(|m| m.to_string().starts_with("image/"));
            if let Some(url) = content.url.as_ref().filter(|_| is_image) {
                media.push(url.to_string());
            }
        }
    }
    for object in &entry.media {
        for thumb in &object.thumbnails {
            media.push(thumb.image.uri.clone());
        }
    }

    let summary = entry.summary.map(|t| t.content);
    let content_encoded = entry.content.and_then(|c| c.body);
    let image = discover_image(
        &media,
        &[summary.as_deref(), content_encoded.as_deref()],
    );

    RawEntry {
        title: entry.title.map(|t| t.content),
        link,
        summary,
        description: None,
        content_encoded,
        published: entry.published,
        updated: entry.updated,
        // dates already went through parse_timestamp inside feed-rs
        raw_dates: Vec::new(),
        image,
    }
}

/// Regex extraction over `<item>` (RSS) or `<entry>` (Atom) blocks.
pub fn parse_fallback(xml: &str) -> Vec<RawEntry> {
    let is_atom = RE_ATOM_FEED.is_match(xml) && RE_ENTRY.is_match(xml);
    let blocks = if is_atom { &*RE_ENTRY } else { &*RE_ITEM };
    blocks
        .find_iter(xml)
        .map(|m| entry_from_block(m.as_str(), is_atom))
        .collect()
}

fn entry_from_block(block: &str, is_atom: bool) -> RawEntry {
    let description = tag_text(block, "description");
    let summary = tag_text(block, "summary");
    let content_encoded =
        tag_text(block, "content:encoded").or_else(|| tag_text(block, "content"));

    let raw_dates = DATE_TAGS
        .iter()
        .filter_map(|tag| tag_text(block, tag))
        .collect();

    let image = discover_image(
        &media_urls(block),
        &[
            description.as_deref(),
            summary.as_deref(),
            content_encoded.as_deref(),
        ],
    );

    RawEntry {
        title: tag_text(block, "title"),
        link: block_link(block, is_atom),
        summary,
        description,
        content_encoded,
        published: None,
        updated: None,
        raw_dates,
        image,
    }
}

/// Inner text of the first `<tag>`, read the way an XML parser would.
///
/// Entities outside CDATA sections are decoded; CDATA contents are kept
/// verbatim.
fn tag_text(block: &str, tag: &str) -> Option<String> {
    let re = TAG_RES.get(tag)?;
    let inner = re.captures(block)?.get(1)?.as_str();

    let mut text = String::with_capacity(inner.len());
    let mut last = 0;
    for caps in RE_CDATA.captures_iter(inner) {
        let (Some(whole), Some(content)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        text.push_str(&html_escape::decode_html_entities(&inner[last..whole.start()]));
        text.push_str(content.as_str());
        last = whole.end();
    }
    text.push_str(&html_escape::decode_html_entities(&inner[last..]));

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn block_link(block: &str, is_atom: bool) -> Option<String> {
    if is_atom {
        let links: Vec<&str> = RE_LINK_TAG.find_iter(block).map(|m| m.as_str()).collect();
        let alternate = links.iter().find(|tag| {
            attr(&RE_REL, tag).is_none_or(|rel| rel.eq_ignore_ascii_case("alternate"))
        });
        if let Some(href) = alternate.or(links.first()).and_then(|tag| attr(&RE_HREF, tag)) {
            return Some(href);
        }
    }
    tag_text(block, "link").map(|l| crate::utils::normalize_text(&l))
}

fn media_urls(block: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for m in RE_MEDIA_CONTENT.find_iter(block) {
        if is_image_type(m.as_str()) {
            urls.extend(attr(&RE_URL, m.as_str()));
        }
    }
    for m in RE_MEDIA_THUMBNAIL.find_iter(block) {
        urls.extend(attr(&RE_URL, m.as_str()));
    }
    for m in RE_ENCLOSURE.find_iter(block) {
        if attr(&RE_TYPE, m.as_str()).is_some_and(|t| t.starts_with("image/")) {
            urls.extend(attr(&RE_URL, m.as_str()));
        }
    }
    urls
}

// Untyped media is assumed to be an image.
fn is_image_type(tag: &str) -> bool {
    attr(&RE_TYPE, tag).is_none_or(|t| t.starts_with("image/"))
}

/// First image for an entry.
///
/// Structured media URLs win; otherwise the first `<img src>` found in the
/// HTML fragments, tried in the order given.
pub fn discover_image(media: &[String], html: &[Option<&str>]) -> Option<String> {
    if let Some(url) = media.iter().map(|u| u.trim()).find(|u| !u.is_empty()) {
        return Some(url.to_string());
    }
    html.iter()
        .flatten()
        .copied()
        .flat_map(|fragment| RE_IMG.find_iter(fragment))
        .find_map(|img| attr(&RE_SRC, img.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Prefeitura</title>
    <link>http://x/</link>
    <description>Notícias</description>
    <item>
      <title>Mutirão de vacinação no bairro</title>
      <link>http://x/noticias/1</link>
      <description>&lt;p&gt;Postos abertos no &lt;b&gt;sábado&lt;/b&gt;&lt;/p&gt;</description>
      <pubDate>Tue, 06 May 2025 13:00:00 -0300</pubDate>
      <media:content url="http://x/img/1.jpg" medium="image" type="image/jpeg"/>
    </item>
    <item>
      <title>Feira cultural</title>
      <link>http://x/noticias/2</link>
      <description><![CDATA[<img src="http://x/img/feira.png"> Sábado na praça]]></description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Agenda</title>
  <id>urn:agenda</id>
  <updated>2025-05-06T12:00:00Z</updated>
  <entry>
    <title>Oficina de teatro</title>
    <id>urn:agenda:1</id>
    <link rel="alternate" href="http://x/agenda/1"/>
    <updated>2025-05-06T12:00:00Z</updated>
    <summary>Inscrições abertas</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parses_rss_items() {
        let entries = parse_feed(RSS, "Cidade");
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title.as_deref(), Some("Mutirão de vacinação no bairro"));
        assert_eq!(first.link.as_deref(), Some("http://x/noticias/1"));
        assert!(first.summary.as_deref().unwrap().contains("sábado"));
        assert!(first.published.is_some());
        assert_eq!(first.image.as_deref(), Some("http://x/img/1.jpg"));

        let second = &entries[1];
        assert_eq!(second.image.as_deref(), Some("http://x/img/feira.png"));
    }

    #[test]
    fn test_parses_atom_entries() {
        let entries = parse_feed(ATOM, "Agenda");
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.title.as_deref(), Some("Oficina de teatro"));
        assert_eq!(e.link.as_deref(), Some("http://x/agenda/1"));
        assert_eq!(e.summary.as_deref(), Some("Inscrições abertas"));
        assert!(e.published.is_some() || e.updated.is_some());
    }

    #[test]
    fn test_garbage_yields_no_entries() {
        assert!(parse_feed("", "X").is_empty());
        assert!(parse_feed("<html><body>404</body></html>", "X").is_empty());
        assert!(parse_feed("\u{0}\u{1}binary", "X").is_empty());
    }

    #[test]
    fn test_fallback_salvages_broken_rss() {
        // unescaped ampersand and an unclosed channel
        let broken = r#"<rss><channel>
            <item><title>Obra & reforma</title><link>http://x/a</link>
              <description>Trecho &nbsp;interditado</description>
              <pubDate>Tue, 06 May 2025 13:00:00 GMT</pubDate></item>
            <item><title><![CDATA[Aviso de <i>trânsito</i>]]></title>
              <content:encoded><![CDATA[<p>Desvio</p><img src='http://x/t.jpg'>]]></content:encoded>
              <dc:date>2025-05-06</dc:date></item>"#;
        let entries = parse_fallback(broken);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].title.as_deref(), Some("Obra & reforma"));
        assert_eq!(entries[0].link.as_deref(), Some("http://x/a"));
        assert_eq!(entries[0].raw_dates, vec!["Tue, 06 May 2025 13:00:00 GMT"]);

        assert_eq!(entries[1].title.as_deref(), Some("Aviso de <i>trânsito</i>"));
        assert_eq!(entries[1].link, None);
        assert_eq!(entries[1].raw_dates, vec!["2025-05-06"]);
        assert_eq!(entries[1].image.as_deref(), Some("http://x/t.jpg"));
        assert!(entries[1].summary.is_none());
        assert!(entries[1].content_encoded.as_deref().unwrap().contains("Desvio"));
    }

    #[test]
    fn test_fallback_reads_atom_links_and_dates() {
        let atom = r#"<feed><entry><title>A</title>
            <link rel="self" href="http://x/self"/>
            <link rel="alternate" href="http://x/a"/>
            <published>2025-05-06T10:00:00Z</published>
            <updated>2025-05-07T10:00:00Z</updated>
            <content type="html">&lt;b&gt;corpo&lt;/b&gt;</content>
            </entry>"#;
        let entries = parse_fallback(atom);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link.as_deref(), Some("http://x/a"));
        assert_eq!(
            entries[0].raw_dates,
            vec!["2025-05-06T10:00:00Z", "2025-05-07T10:00:00Z"]
        );
        assert_eq!(entries[0].content_encoded.as_deref(), Some("<b>corpo</b>"));
    }

    #[test]
    fn test_content_tag_does_not_match_content_encoded() {
        let block = "<item><content:encoded>X</content:encoded></item>";
        assert_eq!(tag_text(block, "content"), None);
        assert_eq!(tag_text(block, "content:encoded").as_deref(), Some("X"));
    }

    #[test]
    fn test_discover_image_prefers_media() {
        let media = vec!["http://x/m.jpg".to_string()];
        let html = Some(r#"<img src="http://x/inline.jpg">"#);
        assert_eq!(discover_image(&media, &[html]).as_deref(), Some("http://x/m.jpg"));
        assert_eq!(discover_image(&[], &[None, html]).as_deref(), Some("http://x/inline.jpg"));
        assert_eq!(discover_image(&[], &[Some("<p>sem imagem</p>")]), None);
    }

    #[test]
    fn test_non_image_enclosures_are_ignored() {
        let block = r#"<item><enclosure url="http://x/ep.mp3" type="audio/mpeg"/>
            <enclosure url="http://x/capa.jpg" type="image/jpeg"/></item>"#;
        assert_eq!(media_urls(block), vec!["http://x/capa.jpg"]);
    }

    fn rss_with(items: &str) -> String {
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title><link>http://x/</link><description>D</description>{items}</channel></rss>"#
        )
    }

    #[test]
    fn test_zoneless_feed_dates_are_read_as_utc() {
        for raw in ["2025-05-06T10:00:00", "2025-05-06 10:00:00"] {
            let body = rss_with(&format!(
                "<item><title>Feira</title><link>http://x/1</link><pubDate>{raw}</pubDate></item>"
            ));
            let entries = parse_feed(&body, "Cidade");
            assert_eq!(entries.len(), 1);
            let published = entries[0].published.as_ref().map(crate::utils::to_iso);
            assert_eq!(published.as_deref(), Some("2025-05-06T10:00:00Z"), "pubDate {raw:?}");
        }
    }

    #[test]
    fn test_both_parsers_agree_on_escaped_cdata() {
        use crate::assembler::{Assembled, assemble};
        use crate::classifier::Classifier;

        let body = rss_with(
            r#"<item><title><![CDATA[Feira &amp; cultura]]></title><link>http://x/1</link>
                 <description><![CDATA[S&aacute;bado na pra&ccedil;a]]></description></item>
               <item><title><![CDATA[Balan&ccedil;o da semana]]></title><link>http://x/2</link>
                 <description><![CDATA[Viol&ecirc;ncia&nbsp;no bairro &#8230;]]></description></item>"#,
        );
        let classifier = Classifier::default();
        let run = |entries: Vec<RawEntry>| -> Vec<Assembled> {
            entries
                .iter()
                .map(|e| assemble(e, "Cidade", &classifier))
                .collect()
        };

        let from_feed_rs = run(parse_feed(&body, "Cidade"));
        let from_fallback = run(parse_fallback(&body));
        assert_eq!(from_feed_rs, from_fallback);

        match &from_feed_rs[0] {
            Assembled::Item(item) => {
                assert_eq!(item.title, "Feira & cultura");
                assert_eq!(item.summary, "Sábado na praça");
            }
            other => panic!("expected an item, got {other:?}"),
        }
        assert_eq!(from_feed_rs[1], Assembled::Blocked);
    }
}
