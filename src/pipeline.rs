// src/pipeline.rs
//! Orchestrator: concurrent fetch of every source (fan-out/fan-in), then the
//! synchronous filter → dedup → rank → compose stages.
//!
//! A run either returns a complete `Digest` or, if its future is dropped,
//! abandons every in-flight fetch without emitting anything.

use futures_util::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::time::{Duration, Instant};

use crate::analyze::{dedupe, filter, rank, DEFAULT_DIGEST_LIMIT};
use crate::digest::{Digest, DigestComposer, FetchReport, SourceReport, DEFAULT_PER_CATEGORY};
use crate::ingest::{FeedFetcher, FeedSource, RawFeedItem};
use crate::keywords::KeywordSet;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("clipper_runs_total", "Pipeline runs that produced a digest.");
        describe_counter!(
            "clipper_items_fetched_total",
            "Items parsed from successful sources."
        );
        describe_counter!(
            "clipper_items_matched_total",
            "Items with at least one keyword hit."
        );
        describe_counter!(
            "clipper_dedup_removed_total",
            "Matched items collapsed into an existing story."
        );
        describe_counter!(
            "clipper_fetch_errors_total",
            "Per-source fetch/parse failures."
        );
        describe_histogram!("clipper_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_histogram!("clipper_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("clipper_last_run_ts", "Unix ts of the last completed run.");
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub fetch_timeout: Duration,
    pub max_in_flight: usize,
    pub digest_limit: usize,
    pub per_category: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            digest_limit: DEFAULT_DIGEST_LIMIT,
            per_category: DEFAULT_PER_CATEGORY,
        }
    }
}

pub struct Pipeline {
    fetcher: FeedFetcher,
    sources: Vec<FeedSource>,
    opts: PipelineOptions,
}

impl Pipeline {
    pub fn new(fetcher: FeedFetcher, sources: Vec<FeedSource>, opts: PipelineOptions) -> Self {
        Self {
            fetcher,
            sources,
            opts,
        }
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    /// Fetch every source with at most `max_in_flight` requests outstanding.
    /// Items and report come back in configured source order.
    pub async fn collect(&self) -> (Vec<RawFeedItem>, FetchReport) {
        let fetcher = &self.fetcher;
        let timeout = self.opts.fetch_timeout;

        let mut outcomes: Vec<_> = stream::iter(self.sources.iter().enumerate())
            .map(|(idx, source)| async move {
                let t0 = Instant::now();
                let res = fetcher.fetch(source, timeout).await;
                histogram!("clipper_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                (idx, res)
            })
            .buffer_unordered(self.opts.max_in_flight.max(1))
            .collect()
            .await;
        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut raw = Vec::new();
        let mut entries = Vec::with_capacity(outcomes.len());
        for (idx, res) in outcomes {
            let source = self.sources[idx].clone();
            let outcome = match res {
                Ok(mut items) => {
                    tracing::info!(source = source.name(), items = items.len(), "feed fetched");
                    let n = items.len();
                    raw.append(&mut items);
                    Ok(n)
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "feed fetch failed");
                    counter!("clipper_fetch_errors_total", "source" => source.name().to_string())
                        .increment(1);
                    Err(e)
                }
            };
            entries.push(SourceReport { source, outcome });
        }

        (raw, FetchReport::new(entries))
    }

    /// The pure stages over a fully collected result set.
    pub fn process(
        &self,
        raw: Vec<RawFeedItem>,
        keywords: &KeywordSet,
        report: FetchReport,
    ) -> Digest {
        let fetched = raw.len();
        let matched = filter(raw, keywords);
        let matched_n = matched.len();
        let canonical = dedupe(matched);
        let removed = matched_n - canonical.len();
        let ranked = rank(canonical, self.opts.digest_limit);

        counter!("clipper_items_fetched_total").increment(fetched as u64);
        counter!("clipper_items_matched_total").increment(matched_n as u64);
        counter!("clipper_dedup_removed_total").increment(removed as u64);
        tracing::info!(
            fetched,
            matched = matched_n,
            duplicates = removed,
            kept = ranked.len(),
            "items processed"
        );

        DigestComposer::new(self.opts.per_category).compose(ranked, keywords, report)
    }

    pub async fn run(&self, keywords: &KeywordSet) -> Digest {
        ensure_metrics_described();

        let (raw, report) = self.collect().await;
        let digest = self.process(raw, keywords, report);

        counter!("clipper_runs_total").increment(1);
        gauge!("clipper_last_run_ts").set(digest.generated_at.timestamp() as f64);
        digest
    }
}
