// src/digest/render.rs
//! Digest → HTML / plaintext / JSON. Pure functions over `Digest`.
//!
//! Every untrusted string (titles, summaries, source names, keywords, links)
//! goes through `html-escape` in the HTML output.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

use crate::analyze::CanonicalItem;
use crate::digest::Digest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown output format {0:?} (expected html, text or json)")]
pub struct UnknownFormat(String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "text" | "txt" | "plain" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// A digest ready for a delivery sink.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDigest {
    pub subject: String,
    pub format: OutputFormat,
    pub body: String,
    /// Plaintext rendering sent next to HTML bodies.
    pub text_alternative: Option<String>,
}

pub fn subject(digest: &Digest) -> String {
    format!(
        "News clipping - {} ({} items)",
        digest.generated_at.format("%Y-%m-%d"),
        digest.total_items()
    )
}

pub fn render(digest: &Digest, format: OutputFormat) -> serde_json::Result<RenderedDigest> {
    let (body, text_alternative) = match format {
        OutputFormat::Html => (render_html(digest), Some(render_text(digest))),
        OutputFormat::Text => (render_text(digest), None),
        OutputFormat::Json => (render_json(digest)?, None),
    };
    Ok(RenderedDigest {
        subject: subject(digest),
        format,
        body,
        text_alternative,
    })
}

fn day_label(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d (%A)").to_string()
}

// Only http(s) links become clickable.
fn safe_href(link: &str) -> String {
    let l = link.trim();
    if l.starts_with("https://") || l.starts_with("http://") {
        encode_double_quoted_attribute(l).into_owned()
    } else {
        "#".to_string()
    }
}

const STYLE: &str = "\
body { font-family: 'Apple SD Gothic Neo', 'Malgun Gothic', sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
.container { max-width: 600px; margin: 0 auto; background: white; border-radius: 8px; overflow: hidden; }
.header { background: #4f46e5; color: white; padding: 30px; text-align: center; }
.content { padding: 30px; }
.category h2 { color: #4f46e5; border-bottom: 2px solid #e5e7eb; padding-bottom: 8px; }
.news-item { border: 1px solid #e5e7eb; border-radius: 6px; padding: 20px; margin-bottom: 15px; }
.news-title { font-weight: 600; color: #1f2937; margin-bottom: 8px; }
.news-summary { color: #6b7280; font-size: 14px; margin-bottom: 10px; }
.news-meta { font-size: 12px; color: #9ca3af; }
.footer { background: #f9fafb; padding: 20px; text-align: center; color: #6b7280; font-size: 12px; }";

pub fn render_html(digest: &Digest) -> String {
    let day = day_label(&digest.generated_at);
    let mut out = String::with_capacity(4096);

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>News clipping - {day}</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n\
         <div class=\"container\">\n<div class=\"header\"><h1>News clipping</h1><p>{day}</p></div>\n\
         <div class=\"content\">\n"
    );

    for group in &digest.groups {
        let _ = writeln!(
            out,
            "<div class=\"category\">\n<h2>{}</h2>",
            encode_text(group.keyword.as_str())
        );
        for item in &group.items {
            write_html_item(&mut out, item);
        }
        out.push_str("</div>\n");
    }

    if digest.is_empty() {
        out.push_str(
            "<div class=\"empty\"><p>No news matched your keywords today.</p></div>\n",
        );
    }
    out.push_str("</div>\n<div class=\"footer\">\n");

    let failures = digest.failed_sources();
    if !failures.is_empty() {
        out.push_str("<p>Unavailable sources: ");
        let names: Vec<String> = failures
            .iter()
            .map(|(src, _)| encode_text(src.name()).into_owned())
            .collect();
        out.push_str(&names.join(", "));
        out.push_str("</p>\n");
    }
    let keywords: Vec<String> = digest
        .keywords
        .iter()
        .map(|k| encode_text(k.as_str()).into_owned())
        .collect();
    let _ = writeln!(out, "<p>Keywords: {}</p>", keywords.join(", "));
    out.push_str("</div>\n</div>\n</body>\n</html>\n");
    out
}

fn write_html_item(out: &mut String, item: &CanonicalItem) {
    let _ = write!(
        out,
        "<div class=\"news-item\">\n<div class=\"news-title\">{}</div>\n",
        encode_text(&item.title)
    );
    if !item.summary.is_empty() {
        let _ = writeln!(
            out,
            "<div class=\"news-summary\">{}</div>",
            encode_text(&item.summary)
        );
    }
    let _ = write!(
        out,
        "<div class=\"news-meta\"><span>{}</span> · <span>{}</span> · \
         <a href=\"{}\" target=\"_blank\">Read more</a></div>\n</div>\n",
        encode_text(&item.sources.join(", ")),
        item.published_at.format("%Y-%m-%d %H:%M UTC"),
        safe_href(&item.link)
    );
}

pub fn render_text(digest: &Digest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", subject(digest));
    let keywords: Vec<&str> = digest.keywords.iter().map(|k| k.as_str()).collect();
    let _ = writeln!(out, "Keywords: {}", keywords.join(", "));

    if digest.is_empty() {
        out.push_str("\nNo news matched your keywords today.\n");
    }
    for group in &digest.groups {
        let _ = writeln!(out, "\n== {} ({}) ==", group.keyword, group.total);
        for item in &group.items {
            let _ = writeln!(out, "- {}", item.title);
            if !item.summary.is_empty() {
                let _ = writeln!(out, "  {}", item.summary);
            }
            let _ = writeln!(out, "  {} | {}", item.sources.join(", "), item.link);
        }
    }

    let failures = digest.failed_sources();
    if !failures.is_empty() {
        out.push_str("\nUnavailable sources:\n");
        for (src, err) in failures {
            let _ = writeln!(out, "- {}: {}", src.name(), err.cause);
        }
    }
    out
}

#[derive(Serialize)]
struct JsonDigest<'a> {
    generated_at: DateTime<Utc>,
    total_items: usize,
    keywords: Vec<&'a str>,
    items: &'a [CanonicalItem],
    groups: Vec<JsonGroup<'a>>,
    sources: Vec<JsonSource<'a>>,
}

#[derive(Serialize)]
struct JsonGroup<'a> {
    keyword: &'a str,
    total: usize,
    items: &'a [CanonicalItem],
}

#[derive(Serialize)]
struct JsonSource<'a> {
    name: &'a str,
    url: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn render_json(digest: &Digest) -> serde_json::Result<String> {
    let doc = JsonDigest {
        generated_at: digest.generated_at,
        total_items: digest.total_items(),
        keywords: digest.keywords.iter().map(|k| k.as_str()).collect(),
        items: &digest.items,
        groups: digest
            .groups
            .iter()
            .map(|g| JsonGroup {
                keyword: g.keyword.as_str(),
                total: g.total,
                items: &g.items,
            })
            .collect(),
        sources: digest
            .report
            .entries
            .iter()
            .map(|e| JsonSource {
                name: e.source.name(),
                url: e.source.url(),
                ok: e.is_ok(),
                items: e.outcome.as_ref().ok().copied(),
                error: e.outcome.as_ref().err().map(|err| err.cause.to_string()),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{DigestComposer, FetchReport, SourceReport};
    use crate::ingest::{FeedSource, FetchCause, FetchError};
    use crate::keywords::{validate, KeywordSet};
    use chrono::TimeZone;

    fn digest_with(title: &str, link: &str) -> Digest {
        let kws = KeywordSet::from_candidates(["보안"]).unwrap();
        let item = CanonicalItem {
            title: title.into(),
            link: link.into(),
            summary: "<img src=x onerror=alert(1)>".into(),
            source: "Src".into(),
            sources: vec!["Src".into()],
            keywords: vec![validate("보안").unwrap()],
            published_at: Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
        };
        let down = FeedSource::named("https://down.test/rss", "Down & Out");
        let report = FetchReport::new(vec![SourceReport {
            outcome: Err(FetchError::new(&down, FetchCause::Status(500))),
            source: down,
        }]);
        DigestComposer::default().compose_at(
            vec![item],
            &kws,
            report,
            Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn html_escapes_untrusted_text() {
        let d = digest_with("<script>alert('x')</script> 보안", "javascript:alert(1)");
        let html = render_html(&d);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<img"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("Down &amp; Out"));
    }

    #[test]
    fn html_keeps_http_links() {
        let d = digest_with("보안 소식", "https://news.test/a?b=1&c=2");
        let html = render_html(&d);
        assert!(html.contains("href=\"https://news.test/a?b=1&amp;c=2\""));
    }

    #[test]
    fn subject_and_text_output() {
        let d = digest_with("보안 소식", "https://news.test/a");
        let r = render(&d, OutputFormat::Text).unwrap();
        assert_eq!(r.subject, "News clipping - 2025-05-01 (1 items)");
        assert!(r.body.contains("== 보안 (1) =="));
        assert!(r.body.contains("- 보안 소식"));
        assert!(r.body.contains("Down & Out: HTTP status 500"));
        assert!(r.text_alternative.is_none());

        let h = render(&d, OutputFormat::Html).unwrap();
        assert!(h.text_alternative.is_some());
    }

    #[test]
    fn json_includes_report() {
        let d = digest_with("보안 소식", "https://news.test/a");
        let v: serde_json::Value =
            serde_json::from_str(&render_json(&d).unwrap()).unwrap();
        assert_eq!(v["total_items"], 1);
        assert_eq!(v["keywords"][0], "보안");
        assert_eq!(v["groups"][0]["items"][0]["title"], "보안 소식");
        assert_eq!(v["sources"][0]["ok"], false);
        assert_eq!(v["sources"][0]["error"], "HTTP status 500");
    }

    #[test]
    fn empty_digest_has_notice() {
        let d = DigestComposer::default().compose(
            Vec::new(),
            &KeywordSet::defaults(),
            FetchReport::default(),
        );
        assert!(render_html(&d).contains("No news matched"));
        assert!(render_text(&d).contains("No news matched"));
    }

    #[test]
    fn format_parsing() {
        assert_eq!("HTML".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }
}
