// tests/feed_parsing.rs
//
// Parser behavior against stored RSS / Atom documents.

use chrono::{TimeZone, Utc};
use news_clipper::ingest::parser::parse_feed;
use news_clipper::ingest::{FeedSource, FetchCause};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"))
}

#[test]
fn rss_fixture_maps_every_item() {
    let src = FeedSource::named("https://feeds.feedburner.com/boannews", "보안뉴스");
    let fetched = Utc.with_ymd_and_hms(2025, 3, 3, 3, 0, 0).unwrap();
    let items = parse_feed(&fixture("boannews.xml"), &src, fetched).expect("parse rss");

    assert_eq!(items.len(), 4);
    let first = &items[0];
    assert_eq!(first.title, "정보보안 위협 분석");
    assert_eq!(first.link, "https://www.boannews.com/media/view.asp?idx=1001");
    assert_eq!(first.snippet, "올해 정보보안 위협 동향을 정리했다.");
    assert!(first.body.contains("<b>정보보안</b>"), "body keeps markup");
    assert_eq!(
        first.published_at,
        Some(Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap())
    );
    assert_eq!(first.source.name(), "보안뉴스");
    assert_eq!(first.fetched_at, fetched);

    // content:encoded without description, dated through dc:date
    let last = &items[3];
    assert_eq!(last.snippet, "정부가 클라우드 보안 가이드를 발표했다.");
    assert_eq!(
        last.published_at,
        Some(Utc.with_ymd_and_hms(2025, 3, 2, 21, 30, 0).unwrap())
    );
}

#[test]
fn unparsable_dates_fall_back_to_fetch_time() {
    let src = FeedSource::new("https://rss.donga.com/total.xml");
    let fetched = Utc.with_ymd_and_hms(2025, 3, 3, 3, 0, 0).unwrap();
    let items = parse_feed(&fixture("donga.xml"), &src, fetched).expect("parse rss");

    assert_eq!(items.len(), 2);
    assert_eq!(items[1].published_at, None);
    assert_eq!(items[1].timestamp(), fetched);
    assert_eq!(src.name(), "rss.donga.com");
}

#[test]
fn atom_fixture_uses_alternate_links() {
    let src = FeedSource::named("https://blog.example.com/atom.xml", "Example");
    let items = parse_feed(&fixture("atom.xml"), &src, Utc::now()).expect("parse atom");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Zero-day <patched> in VPN appliance");
    assert_eq!(items[0].link, "https://blog.example.com/posts/vpn-zero-day");
    assert_eq!(
        items[0].published_at,
        Some(Utc.with_ymd_and_hms(2025, 3, 3, 0, 30, 0).unwrap())
    );

    // no summary: snippet comes from stripped content, date from <updated>
    assert_eq!(items[1].link, "https://blog.example.com/posts/privacy-q1");
    assert_eq!(items[1].snippet, "Summary of 개인정보 incidents.");
    assert_eq!(
        items[1].published_at,
        Some(Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap())
    );
}

#[test]
fn non_feed_documents_are_malformed() {
    let src = FeedSource::new("https://example.com/");
    for doc in ["<html><body>nope</body></html>", "", "plain text"] {
        let err = parse_feed(doc, &src, Utc::now()).unwrap_err();
        assert!(matches!(err, FetchCause::Malformed(_)), "{doc:?} -> {err:?}");
    }
}
