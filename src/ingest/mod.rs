// src/ingest/mod.rs
//! Feed collection: transports, parsing, and per-source fetching.

pub mod fetcher;
pub mod fixture;
pub mod http;
pub mod parser;
pub mod types;

pub use fetcher::FeedFetcher;
pub use types::{FeedSource, FeedTransport, FetchCause, FetchError, RawFeedItem};

use once_cell::sync::OnceCell;
use regex::Regex;

/// Summaries longer than this are cut and suffixed with `...`.
pub const SUMMARY_MAX_CHARS: usize = 150;

fn whitespace_re() -> &'static Regex {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// Plain text from feed markup: drop tags, decode entities, collapse whitespace.
pub fn strip_markup(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)<[^>]*>").expect("tag regex"));

    // Tags first: entity-encoded `&lt;b&gt;` is text, not markup.
    let out = re_tags.replace_all(s, " ");
    let out = html_escape::decode_html_entities(&out);
    collapse_whitespace(&out)
}

/// Runs of whitespace become one space; ends are trimmed.
pub fn collapse_whitespace(s: &str) -> String {
    whitespace_re().replace_all(s, " ").trim().to_string()
}

/// Item titles are text as delivered. Angle brackets in headlines such as
/// `<정보보안> 주간 동향` are content, so no tag stripping happens here.
/// `html_escaped` titles (Atom `type="html"`) get one extra entity decode.
pub fn clean_title(s: &str, html_escaped: bool) -> String {
    if html_escaped {
        collapse_whitespace(&html_escape::decode_html_entities(s))
    } else {
        collapse_whitespace(s)
    }
}

/// Short excerpt for the digest.
pub fn summarize(s: &str) -> String {
    let clean = strip_markup(s);
    if clean.chars().count() > SUMMARY_MAX_CHARS {
        let mut out: String = clean.chars().take(SUMMARY_MAX_CHARS - 3).collect();
        out.push_str("...");
        out
    } else {
        clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_markup_collapses_ws_and_tags() {
        let s = "  <p>Hello,&nbsp;&nbsp;<b>world</b></p>\n\n ok ";
        assert_eq!(strip_markup(s), "Hello, world ok");
    }

    #[test]
    fn titles_keep_angle_brackets() {
        assert_eq!(clean_title("<정보보안>  주간 동향 ", false), "<정보보안> 주간 동향");
        assert_eq!(clean_title("AT&amp;T &lt;b&gt;", true), "AT&T <b>");
        assert_eq!(clean_title("AT&amp;T", false), "AT&amp;T");
    }

    #[test]
    fn summarize_caps_length() {
        let long = "가".repeat(200);
        let out = summarize(&long);
        assert_eq!(out.chars().count(), 150);
        assert!(out.ends_with("..."));
        assert_eq!(summarize("<i>short</i>"), "short");
    }
}
