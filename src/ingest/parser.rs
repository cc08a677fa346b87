// src/ingest/parser.rs
//! RSS 2.0 and Atom 1.0 documents into `RawFeedItem`s.

use chrono::{DateTime, Utc};
use metrics::histogram;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::{clean_title, strip_markup};
use crate::ingest::types::{FeedSource, FetchCause, RawFeedItem};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded", alias = "encoded")]
    content: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date", alias = "date")]
    dc_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

impl AtomText {
    fn is_html(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("html"))
    }
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    fn alternate_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.first())
            .and_then(|l| l.href.as_deref())
    }
}

/// Parse a feed document fetched from `source` at `fetched_at`.
pub fn parse_feed(
    xml: &str,
    source: &FeedSource,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<RawFeedItem>, FetchCause> {
    let t0 = std::time::Instant::now();
    let xml = scrub_html_entities_for_xml(xml.trim_start_matches('\u{feff}'));

    let items = match root_element(&xml).as_deref() {
        Some("rss") => parse_rss(&xml, source, fetched_at)?,
        Some("feed") => parse_atom(&xml, source, fetched_at)?,
        Some(other) => {
            return Err(FetchCause::Malformed(format!(
                "unsupported root element <{other}>"
            )))
        }
        None => return Err(FetchCause::Malformed("no root element".to_string())),
    };

    histogram!("clipper_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(items)
}

fn parse_rss(
    xml: &str,
    source: &FeedSource,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<RawFeedItem>, FetchCause> {
    let rss: Rss = from_str(xml).map_err(|e| FetchCause::Malformed(format!("rss: {e}")))?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .map(|it| {
            let description = it.description.unwrap_or_default();
            let body = match it.content {
                Some(c) if !c.trim().is_empty() => c,
                _ => description.clone(),
            };
            let snippet = if description.trim().is_empty() {
                strip_markup(&body)
            } else {
                strip_markup(&description)
            };
            RawFeedItem {
                title: clean_title(it.title.as_deref().unwrap_or_default(), false),
                snippet,
                body,
                link: it.link.map(|l| l.trim().to_string()).unwrap_or_default(),
                published_at: it
                    .pub_date
                    .as_deref()
                    .or(it.dc_date.as_deref())
                    .and_then(parse_timestamp),
                fetched_at,
                source: source.clone(),
            }
        })
        .collect())
}

fn parse_atom(
    xml: &str,
    source: &FeedSource,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<RawFeedItem>, FetchCause> {
    let feed: AtomFeed = from_str(xml).map_err(|e| FetchCause::Malformed(format!("atom: {e}")))?;
    Ok(feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry.alternate_link().unwrap_or_default().trim().to_string();
            let summary = entry.summary.map(|t| t.value).unwrap_or_default();
            let content = entry.content.map(|t| t.value).unwrap_or_default();
            let body = if content.trim().is_empty() {
                summary.clone()
            } else {
                content
            };
            let snippet = if summary.trim().is_empty() {
                strip_markup(&body)
            } else {
                strip_markup(&summary)
            };
            RawFeedItem {
                title: entry
                    .title
                    .map(|t| clean_title(&t.value, t.is_html()))
                    .unwrap_or_default(),
                snippet,
                body,
                link,
                published_at: entry
                    .published
                    .as_deref()
                    .or(entry.updated.as_deref())
                    .and_then(parse_timestamp),
                fetched_at,
                source: source.clone(),
            }
        })
        .collect())
}

/// Local name of the first element, e.g. `rss` or `feed`.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

/// RFC 2822 (RSS) or RFC 3339 (Atom, Dublin Core). Unparsable dates yield `None`.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond()))
        // chrono is laxer about obsolete zone names ("GMT", "EST")
        .or_else(|| {
            DateTime::parse_from_rfc2822(ts)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

// HTML entities are common in feeds but undefined in XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", "&#160;")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&middot;", "&#183;")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn src() -> FeedSource {
        FeedSource::named("https://feeds.example.test/rss", "Example")
    }

    #[test]
    fn rss_items_are_mapped() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Example</title>
    <item>
      <title>정보보안 위협&nbsp;분석</title>
      <link> https://example.test/a </link>
      <description><![CDATA[<p>요약 <b>본문</b></p>]]></description>
      <pubDate>Mon, 06 Jan 2025 09:00:00 +0900</pubDate>
    </item>
    <item>
      <title>No date</title>
    </item>
  </channel>
</rss>"#;
        let now = Utc.with_ymd_and_hms(2025, 1, 7, 0, 0, 0).unwrap();
        let items = parse_feed(xml, &src(), now).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "정보보안 위협 분석");
        assert_eq!(items[0].link, "https://example.test/a");
        assert_eq!(items[0].snippet, "요약 본문");
        assert!(items[0].body.contains("<b>본문</b>"));
        assert_eq!(
            items[0].published_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap())
        );
        assert_eq!(items[1].published_at, None);
        assert_eq!(items[1].timestamp(), now);
        assert_eq!(items[1].source.name(), "Example");
    }

    #[test]
    fn bracketed_headline_survives_and_matches() {
        let xml = r#"<rss version="2.0"><channel>
  <item>
    <title>&lt;정보보안&gt; 주간   동향</title>
    <link>https://example.test/weekly</link>
    <description>이번 주 소식</description>
  </item>
</channel></rss>"#;
        let items = parse_feed(xml, &src(), Utc::now()).unwrap();
        assert_eq!(items[0].title, "<정보보안> 주간 동향");

        let kws = crate::keywords::KeywordSet::from_candidates(["정보보안"]).unwrap();
        let matched = crate::analyze::filter(items, &kws);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].keywords()[0].as_str(), "정보보안");
    }

    #[test]
    fn atom_text_titles_are_not_entity_decoded_twice() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title type="text">R&amp;D &amp;amp; more</title><link href="https://example.test/1"/></entry>
  <entry><title type="html">&lt;물리보안&gt; R&amp;amp;D</title><link href="https://example.test/2"/></entry>
</feed>"#;
        let items = parse_feed(xml, &src(), Utc::now()).unwrap();
        assert_eq!(items[0].title, "R&D &amp; more");
        assert_eq!(items[1].title, "<물리보안> R&D");
    }

    #[test]
    fn atom_entries_are_mapped() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Blog</title>
  <entry>
    <title type="html">Access &amp; control</title>
    <link rel="self" href="https://blog.test/self"/>
    <link rel="alternate" href="https://blog.test/post"/>
    <updated>2025-02-01T10:00:00Z</updated>
    <summary>출입통제 news</summary>
  </entry>
</feed>"#;
        let now = Utc::now();
        let items = parse_feed(xml, &src(), now).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Access & control");
        assert_eq!(items[0].link, "https://blog.test/post");
        assert_eq!(items[0].snippet, "출입통제 news");
        assert_eq!(
            items[0].published_at,
            Some(Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let now = Utc::now();
        assert!(matches!(
            parse_feed("<html><body>nope</body></html>", &src(), now),
            Err(FetchCause::Malformed(_))
        ));
        assert!(matches!(
            parse_feed("not xml at all", &src(), now),
            Err(FetchCause::Malformed(_))
        ));
    }

    #[test]
    fn timestamps_accept_both_formats() {
        assert!(parse_timestamp("Tue, 10 Jun 2025 04:00:00 GMT").is_some());
        assert!(parse_timestamp("2025-06-10T04:00:00+09:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
