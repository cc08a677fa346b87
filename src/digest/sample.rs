// src/digest/sample.rs
//! Synthetic digest content for test emails: one item per keyword, no network.

use chrono::{DateTime, Duration, Utc};

use crate::analyze::CanonicalItem;
use crate::keywords::KeywordSet;

pub const SAMPLE_SOURCE: &str = "news-clipper test";

pub fn sample_items(keywords: &KeywordSet, now: DateTime<Utc>) -> Vec<CanonicalItem> {
    keywords
        .iter()
        .enumerate()
        .map(|(i, keyword)| CanonicalItem {
            title: format!("{keyword} 관련 최신 뉴스"),
            link: String::new(),
            summary: format!("{keyword}와 관련된 중요한 업데이트와 최신 동향을 다룬 뉴스입니다."),
            source: SAMPLE_SOURCE.to_string(),
            sources: vec![SAMPLE_SOURCE.to_string()],
            keywords: vec![keyword.clone()],
            published_at: now - Duration::minutes(i as i64),
        })
        .collect()
}
