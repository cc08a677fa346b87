// src/api.rs
//! Keyword management HTTP surface (+ test email).
//!
//! Mutations are pure `KeywordSet` transformations; the new set is persisted
//! through the store before it replaces the in-memory copy.

use std::sync::{Arc, RwLock};

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::store::KeywordStore;
use crate::digest::{render, sample::sample_items, DigestComposer, FetchReport, OutputFormat};
use crate::keywords::{KeywordError, KeywordSet, RejectedEntry};
use crate::notify::{is_valid_email, recipient_tag, DeliveryError, DeliverySink};

#[derive(Clone)]
pub struct ApiState {
    keywords: Arc<RwLock<Current>>,
    store: Arc<dyn KeywordStore>,
    sink: Arc<dyn DeliverySink>,
}

struct Current {
    set: KeywordSet,
    updated_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(
        initial: KeywordSet,
        store: Arc<dyn KeywordStore>,
        sink: Arc<dyn DeliverySink>,
    ) -> Self {
        Self {
            keywords: Arc::new(RwLock::new(Current {
                set: initial,
                updated_at: Utc::now(),
            })),
            store,
            sink,
        }
    }

    /// Current set and the time it last changed.
    fn snapshot(&self) -> Result<(KeywordSet, DateTime<Utc>), ApiError> {
        let guard = self
            .keywords
            .read()
            .map_err(|_| ApiError::Storage("keyword lock poisoned".into()))?;
        Ok((guard.set.clone(), guard.updated_at))
    }

    /// Apply `f` to the current set, persist the result, then swap it in.
    /// `updated_at` only moves when the set actually changed.
    fn mutate<F>(&self, f: F) -> Result<(KeywordSet, DateTime<Utc>), ApiError>
    where
        F: FnOnce(&KeywordSet) -> Result<KeywordSet, ApiError>,
    {
        let mut guard = self
            .keywords
            .write()
            .map_err(|_| ApiError::Storage("keyword lock poisoned".into()))?;
        let next = f(&guard.set)?;
        if next != guard.set {
            self.store.save(&next).map_err(|e| {
                tracing::error!(error = %format!("{e:#}"), "persisting keywords failed");
                ApiError::Storage("failed to save keywords".into())
            })?;
            guard.set = next.clone();
            guard.updated_at = Utc::now();
        }
        Ok((next, guard.updated_at))
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route(
            "/keywords",
            get(list_keywords)
                .post(add_keyword)
                .put(replace_keywords)
                .delete(remove_keyword),
        )
        .route("/test-email", post(test_email))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug)]
enum ApiError {
    Keyword(KeywordError),
    Rejected(RejectedEntry),
    BadRequest(String),
    Storage(String),
    Delivery(DeliveryError),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    code: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
}

fn keyword_status(e: &KeywordError) -> (StatusCode, &'static str) {
    match e {
        KeywordError::InvalidKeyword { .. } => (StatusCode::BAD_REQUEST, "INVALID_KEYWORD"),
        KeywordError::DuplicateKeyword(_) => (StatusCode::CONFLICT, "DUPLICATE_KEYWORD"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, error, index) = match self {
            ApiError::Keyword(e) => {
                let (status, code) = keyword_status(&e);
                (status, code, e.to_string(), None)
            }
            ApiError::Rejected(r) => {
                let (_, code) = keyword_status(&r.error);
                (StatusCode::BAD_REQUEST, code, r.to_string(), Some(r.index))
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE", msg, None),
            ApiError::Delivery(e) => (StatusCode::BAD_GATEWAY, "DELIVERY", e.to_string(), None),
        };
        let body = ErrorBody {
            success: false,
            code,
            error,
            index,
        };
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, turning axum's rejection into our error body.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        let reason = rejection.body_text();
        tracing::debug!(error = %reason, "request body rejected");
        ApiError::BadRequest(reason)
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeywordsResp {
    success: bool,
    keywords: KeywordSet,
    last_updated: DateTime<Utc>,
}

#[derive(Serialize)]
struct KeywordResp {
    success: bool,
    message: &'static str,
    keyword: String,
    keywords: KeywordSet,
}

#[derive(Deserialize)]
struct AddReq {
    keyword: Option<String>,
}

#[derive(Deserialize)]
struct ReplaceReq {
    keywords: Vec<String>,
}

#[derive(Deserialize)]
struct RemoveQuery {
    keyword: Option<String>,
}

async fn list_keywords(State(state): State<ApiState>) -> Result<Json<KeywordsResp>, ApiError> {
    let (keywords, last_updated) = state.snapshot()?;
    Ok(Json(KeywordsResp {
        success: true,
        keywords,
        last_updated,
    }))
}

async fn add_keyword(
    State(state): State<ApiState>,
    payload: Result<Json<AddReq>, JsonRejection>,
) -> Result<(StatusCode, Json<KeywordResp>), ApiError> {
    let Some(candidate) = json_body(payload)?.keyword else {
        return Err(ApiError::BadRequest("keyword is required".into()));
    };
    let (next, _) = state.mutate(|cur| {
        cur.add(&candidate).map_err(|e| {
            tracing::debug!(error = %e, "keyword rejected");
            ApiError::Keyword(e)
        })
    })?;
    Ok((
        StatusCode::CREATED,
        Json(KeywordResp {
            success: true,
            message: "keyword added",
            keyword: candidate.trim().to_string(),
            keywords: next,
        }),
    ))
}

async fn replace_keywords(
    State(state): State<ApiState>,
    payload: Result<Json<ReplaceReq>, JsonRejection>,
) -> Result<Json<KeywordsResp>, ApiError> {
    let body = json_body(payload)?;
    let (keywords, last_updated) = state.mutate(|cur| {
        cur.replace_all(&body.keywords).map_err(|r| {
            tracing::debug!(error = %r, "keyword list rejected");
            ApiError::Rejected(r)
        })
    })?;
    Ok(Json(KeywordsResp {
        success: true,
        keywords,
        last_updated,
    }))
}

async fn remove_keyword(
    State(state): State<ApiState>,
    Query(q): Query<RemoveQuery>,
) -> Result<Json<KeywordResp>, ApiError> {
    let keyword = match q.keyword.as_deref().map(str::trim) {
        Some(k) if !k.is_empty() => k.to_string(),
        _ => return Err(ApiError::BadRequest("keyword query parameter is required".into())),
    };
    let (next, _) = state.mutate(|cur| Ok(cur.remove(&keyword)))?;
    Ok(Json(KeywordResp {
        success: true,
        message: "keyword removed",
        keyword,
        keywords: next,
    }))
}

#[derive(Deserialize)]
struct TestEmailReq {
    email: Option<String>,
    keywords: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TestEmailResp {
    success: bool,
    message: &'static str,
    news_count: usize,
}

async fn test_email(
    State(state): State<ApiState>,
    payload: Result<Json<TestEmailReq>, JsonRejection>,
) -> Result<Json<TestEmailResp>, ApiError> {
    let body = json_body(payload)?;
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(ApiError::BadRequest("email address is required".into()));
    }
    if !is_valid_email(email) {
        return Err(ApiError::BadRequest("email address is not valid".into()));
    }

    let keywords = match &body.keywords {
        Some(list) => KeywordSet::from_candidates(list).map_err(ApiError::Rejected)?,
        None => state.snapshot()?.0,
    };

    let now = Utc::now();
    let digest = DigestComposer::default().compose_at(
        sample_items(&keywords, now),
        &keywords,
        FetchReport::default(),
        now,
    );
    let rendered = render(&digest, OutputFormat::Html)
        .map_err(|e| ApiError::Storage(format!("rendering failed: {e}")))?;

    state
        .sink
        .deliver(&rendered, email)
        .await
        .map_err(ApiError::Delivery)?;

    tracing::info!(
        recipient = %recipient_tag(email),
        items = digest.total_items(),
        "test email sent"
    );
    Ok(Json(TestEmailResp {
        success: true,
        message: "test email sent",
        news_count: digest.total_items(),
    }))
}
