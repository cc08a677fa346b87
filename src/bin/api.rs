//! news-clipper-api — keyword management server.
//! Boots the Axum router with the keyword store, the delivery sink and `/metrics`.

use std::sync::Arc;

use anyhow::Context;

use news_clipper::api::{router, ApiState};
use news_clipper::config::store::{JsonFileStore, KeywordStore};
use news_clipper::config::{FileSettingsProvider, SettingsProvider, DEFAULT_KEYWORDS_PATH};
use news_clipper::metrics::Metrics;
use news_clipper::notify::{DeliverySink, EmailSink, LogSink};
use news_clipper::{telemetry, KeywordSet};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let metrics = Metrics::init()?;

    // The keyword surface works without a full settings file.
    let provider = FileSettingsProvider::from_env();
    let (store, keywords) = match provider.load() {
        Ok(rs) => (JsonFileStore::new(rs.settings.keywords_path), rs.keywords),
        Err(e) => {
            tracing::warn!(
                path = %provider.path().display(),
                error = %e,
                "settings unavailable; using default keyword store"
            );
            let store = JsonFileStore::new(DEFAULT_KEYWORDS_PATH);
            let keywords = store
                .load()
                .context("loading keyword store")?
                .unwrap_or_else(KeywordSet::defaults);
            (store, keywords)
        }
    };

    let sink: Arc<dyn DeliverySink> = match EmailSink::from_env() {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            tracing::warn!(
                error = %format!("{e:#}"),
                "SMTP not configured; test emails are only logged"
            );
            Arc::new(LogSink)
        }
    };

    tracing::info!(
        keywords = keywords.len(),
        store = %store.path().display(),
        sink = sink.name(),
        "keyword api starting"
    );
    let app = router(ApiState::new(keywords, Arc::new(store), sink)).merge(metrics.router());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("serving http")?;
    Ok(())
}
