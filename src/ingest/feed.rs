// src/ingest/feed.rs
//! Feed normalizer: one raw RSS/Atom document in, canonical `NewsRecord`s out.
//!
//! Per-entry failures degrade instead of aborting: an entry without a link is
//! skipped, an unparsable date falls back to the current time. A document
//! that is neither RSS 2.0 nor Atom is the caller's (per-source) error.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::types::NewsRecord;

// ---------- RSS 2.0 ----------

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded")]
    content_encoded: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date")]
    dc_date: Option<String>,
    #[serde(default)]
    enclosure: Vec<Enclosure>,
    #[serde(rename = "media:content", default)]
    media: Vec<MediaContent>,
    #[serde(rename = "media:thumbnail", default)]
    thumbnails: Vec<MediaThumbnail>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaContent {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
    #[serde(rename = "@medium")]
    medium: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaThumbnail {
    #[serde(rename = "@url")]
    url: Option<String>,
}

// ---------- Atom ----------

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextValue>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<TextValue>,
    content: Option<TextValue>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Atom text constructs carry a `type` attribute; only the text matters here.
#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(rename = "$text")]
    value: Option<String>,
}

impl TextValue {
    fn into_inner(self) -> Option<String> {
        self.value
    }
}

// ---------- Normalization ----------

/// Parse one raw feed document into canonical records. The root element
/// decides the dialect; anything but `<rss>` or `<feed>` is an error.
pub fn parse_feed(source: &str, document: &str) -> Result<Vec<NewsRecord>> {
    match root_name(document).as_deref() {
        Some("rss") => {
            let rss: Rss = from_str(document).context("parsing rss document")?;
            Ok(collect_rss(source, rss))
        }
        Some("feed") => {
            let atom: AtomFeed = from_str(document).context("parsing atom document")?;
            Ok(collect_atom(source, atom))
        }
        other => Err(anyhow!(
            "unrecognized feed document (root {:?}, expected rss or feed)",
            other
        )),
    }
}

/// Local name of the document's root element, if any.
fn root_name(document: &str) -> Option<String> {
    let mut reader = Reader::from_str(document);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn collect_rss(source: &str, rss: Rss) -> Vec<NewsRecord> {
    rss.channel
        .items
        .into_iter()
        .filter_map(|it| {
            // The link seeds the identity; nothing usable without it.
            let link = non_blank(it.link)?;
            let image_url = it
                .content_encoded
                .as_deref()
                .and_then(first_image)
                .or_else(|| image_from_enclosures(&it.enclosure))
                .or_else(|| image_from_media(&it.media))
                .or_else(|| it.thumbnails.iter().find_map(|t| clean_url(&t.url)));
            let published = it.pub_date.or(it.dc_date);
            Some(build_record(
                source,
                link,
                it.title,
                it.description,
                image_url,
                published,
            ))
        })
        .collect()
}

fn collect_atom(source: &str, feed: AtomFeed) -> Vec<NewsRecord> {
    feed.entries
        .into_iter()
        .filter_map(|entry| {
            let link = pick_atom_link(&entry.links)?;
            let content_html = entry.content.and_then(TextValue::into_inner);
            let image_url = content_html.as_deref().and_then(first_image);
            let summary = entry
                .summary
                .and_then(TextValue::into_inner)
                .or(content_html);
            let published = entry.published.or(entry.updated);
            Some(build_record(
                source,
                link,
                entry.title.and_then(TextValue::into_inner),
                summary,
                image_url,
                published,
            ))
        })
        .collect()
}

fn build_record(
    source: &str,
    link: String,
    title: Option<String>,
    summary_html: Option<String>,
    image_url: Option<String>,
    published_raw: Option<String>,
) -> NewsRecord {
    // A malformed or absent date must never drop the entry.
    let published_at = published_raw
        .as_deref()
        .and_then(parse_published)
        .unwrap_or_else(Utc::now);
    NewsRecord {
        id: url_identity(&link),
        source: source.to_string(),
        title: title.as_deref().map(strip_html).unwrap_or_default(),
        url: link,
        summary: summary_html.as_deref().map(strip_html).unwrap_or_default(),
        image_url,
        published_at,
    }
}

/// Prefer the alternate link; fall back to the first link with an href.
fn pick_atom_link(links: &[AtomLink]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .and_then(|l| clean_url(&l.href))
        .or_else(|| links.iter().find_map(|l| clean_url(&l.href)))
}

/// Deterministic identity: SHA-256 hex of the trimmed link.
pub fn url_identity(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.trim().as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Decode entities, drop tags, collapse whitespace, trim.
pub fn strip_html(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();

    let decoded = html_escape::decode_html_entities(s);
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let no_tags = re_tags.replace_all(&decoded, " ");
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&no_tags, " ").trim().to_string()
}

/// First embedded image reference in a rich-content block.
pub fn first_image(html: &str) -> Option<String> {
    static RE_IMG: OnceCell<Regex> = OnceCell::new();
    let re = RE_IMG
        .get_or_init(|| Regex::new(r#"(?is)<img[^>]+src\s*=\s*["']([^"']+)["']"#).unwrap());
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn image_from_enclosures(enclosures: &[Enclosure]) -> Option<String> {
    enclosures
        .iter()
        .find(|e| e.mime.as_deref().is_some_and(|m| m.starts_with("image/")))
        .and_then(|e| clean_url(&e.url))
}

fn image_from_media(media: &[MediaContent]) -> Option<String> {
    media
        .iter()
        .find(|m| {
            m.medium.as_deref() == Some("image")
                || m.mime.as_deref().is_some_and(|t| t.starts_with("image/"))
        })
        .and_then(|m| clean_url(&m.url))
}

/// Permissive date parsing: RFC 2822, RFC 3339, then common tz-naive shapes
/// taken as UTC. `None` means the caller substitutes "now".
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%d %b %Y %H:%M:%S",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn clean_url(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
