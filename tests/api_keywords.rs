// tests/api_keywords.rs
//
// HTTP-level tests for the keyword router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    Router,
};
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt as _; // for `oneshot`

use news_clipper::config::store::{KeywordStore, MemoryStore};
use news_clipper::notify::{DeliveryError, DeliverySink, MemorySink};
use news_clipper::{router, ApiState, KeywordSet};

const BODY_LIMIT: usize = 1024 * 1024;

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    sink: Arc<MemorySink>,
}

fn harness_with(sink: MemorySink) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(sink);
    let state = ApiState::new(
        KeywordSet::from_candidates(["정보보안", "물리보안"]).unwrap(),
        store.clone() as Arc<dyn KeywordStore>,
        sink.clone() as Arc<dyn DeliverySink>,
    );
    Harness {
        app: router(state),
        store,
        sink,
    }
}

fn harness() -> Harness {
    harness_with(MemorySink::new())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&v).unwrap())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn stored(h: &Harness) -> Option<Vec<String>> {
    h.store.load().unwrap().map(|s| s.as_strings())
}

#[tokio::test]
async fn health_is_ok() {
    let h = harness();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = h.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn list_returns_current_keywords() {
    let h = harness();
    let (status, body) = call(&h.app, "GET", "/keywords", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["keywords"], json!(["정보보안", "물리보안"]));
    assert!(body["lastUpdated"].is_string());
}

#[tokio::test]
async fn add_persists_and_rejects_bad_input() {
    let h = harness();

    let (status, body) = call(&h.app, "POST", "/keywords", Some(json!({"keyword": " 개인정보 "}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["keyword"], "개인정보");
    assert_eq!(body["keywords"], json!(["정보보안", "물리보안", "개인정보"]));
    assert_eq!(
        stored(&h),
        Some(vec!["정보보안".into(), "물리보안".into(), "개인정보".into()])
    );

    let (status, body) = call(&h.app, "POST", "/keywords", Some(json!({"keyword": "개인정보"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "DUPLICATE_KEYWORD");

    let (status, body) = call(&h.app, "POST", "/keywords", Some(json!({"keyword": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_KEYWORD");

    let long = "가".repeat(51);
    let (status, _) = call(&h.app, "POST", "/keywords", Some(json!({"keyword": long}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&h.app, "POST", "/keywords", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // rejected mutations never reach the store
    assert_eq!(stored(&h).map(|v| v.len()), Some(3));
}

#[tokio::test]
async fn replace_reports_the_offending_index() {
    let h = harness();

    let (status, body) = call(
        &h.app,
        "PUT",
        "/keywords",
        Some(json!({"keywords": ["a", "b", "a"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["index"], 2);
    assert_eq!(stored(&h), None);

    let (status, body) = call(
        &h.app,
        "PUT",
        "/keywords",
        Some(json!({"keywords": ["랜섬웨어", " 해킹 "]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keywords"], json!(["랜섬웨어", "해킹"]));
    assert_eq!(stored(&h), Some(vec!["랜섬웨어".into(), "해킹".into()]));
}

#[tokio::test]
async fn wrongly_typed_bodies_get_a_json_error() {
    let h = harness();

    for (method, payload) in [
        ("POST", json!({"keyword": 5})),
        ("PUT", json!({"keywords": "x"})),
        ("PUT", json!({"keywords": ["a", 3]})),
    ] {
        let (status, body) = call(&h.app, method, "/keywords", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {payload}");
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(!body["error"].as_str().unwrap_or_default().is_empty());
    }

    let (status, body) = call(&h.app, "POST", "/test-email", Some(json!({"email": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(stored(&h), None);
}

#[tokio::test]
async fn malformed_json_gets_a_json_error() {
    let h = harness();
    let req = Request::builder()
        .method("POST")
        .uri("/keywords")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = h.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).expect("json error body");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn replacing_with_the_same_list_keeps_last_updated() {
    let h = harness();
    let (_, before) = call(&h.app, "GET", "/keywords", None).await;

    let (status, body) = call(
        &h.app,
        "PUT",
        "/keywords",
        Some(json!({"keywords": ["정보보안", "물리보안"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lastUpdated"], before["lastUpdated"]);

    let (_, after) = call(&h.app, "GET", "/keywords", None).await;
    assert_eq!(after["lastUpdated"], before["lastUpdated"]);
}

#[tokio::test]
async fn delete_requires_the_parameter_and_tolerates_absent_keywords() {
    let h = harness();

    let (status, _) = call(&h.app, "DELETE", "/keywords", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&h.app, "DELETE", "/keywords?keyword=nothing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keywords"], json!(["정보보안", "물리보안"]));
    assert_eq!(stored(&h), None, "no-op removal writes nothing");

    let uri = "/keywords?keyword=%EB%AC%BC%EB%A6%AC%EB%B3%B4%EC%95%88"; // 물리보안
    let (status, body) = call(&h.app, "DELETE", uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keywords"], json!(["정보보안"]));
}

#[tokio::test]
async fn test_email_sends_a_sample_digest() {
    let h = harness();

    let (status, body) = call(
        &h.app,
        "POST",
        "/test-email",
        Some(json!({"email": "me@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["newsCount"], 2);

    let delivered = h.sink.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "me@example.com");
    assert!(delivered[0].1.body.contains("정보보안 관련 최신 뉴스"));
}

#[tokio::test]
async fn test_email_validates_input() {
    let h = harness();

    let (status, _) = call(&h.app, "POST", "/test-email", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&h.app, "POST", "/test-email", Some(json!({"email": "nope"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &h.app,
        "POST",
        "/test-email",
        Some(json!({"email": "me@example.com", "keywords": ["ok", ""]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["index"], 1);
    assert_eq!(h.sink.count(), 0);
}

#[tokio::test]
async fn test_email_delivery_failure_is_bad_gateway() {
    let h = harness_with(MemorySink::failing(DeliveryError::Transport("535 auth".into())));
    let (status, body) = call(
        &h.app,
        "POST",
        "/test-email",
        Some(json!({"email": "me@example.com", "keywords": ["랜섬웨어"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("535 auth"));
}
