use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use store::{InMemoryObjectStore, InMemoryWarehouse, RecordingWorkflowStarter};
use tower::ServiceExt;
use wordstat::{Pipeline, WordstatConfig};

const TEXT: &str = "the cat sat on the mat the cat ran";

struct Harness {
    app: Router,
    warehouse: Arc<InMemoryWarehouse>,
    starter: Arc<RecordingWorkflowStarter>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryObjectStore::new());
    store.put("b", "a.txt", TEXT).unwrap();
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let starter = Arc::new(RecordingWorkflowStarter::new());

    let pipeline = Pipeline::builder(store, warehouse.clone())
        .workflow_starter(starter.clone())
        .build();
    let state = ServerState::with_pipeline(
        ServerConfig::default(),
        WordstatConfig::default(),
        pipeline,
    );
    Harness {
        app: build_router(Arc::new(state)),
        warehouse,
        starter,
    }
}

async fn post(app: &Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn load_body() -> Value {
    json!({
        "filename": "a.txt",
        "bucket": "b",
        "size_bytes": 34,
        "upload_date": "2024-06-10T08:00:00Z",
        "total_words": 9,
        "top_10_words": [{"word": "the", "count": 3}, {"word": "cat", "count": 2}],
        "generation": "1"
    })
}

#[tokio::test]
async fn word_count_returns_total() {
    let h = harness();
    let (status, body) = post(
        &h.app,
        "/word-count",
        json!({"bucket_name": "b", "file_path": "a.txt"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"total_words": 9}));
}

#[tokio::test]
async fn top_words_returns_ranking() {
    let h = harness();
    let (status, body) = post(
        &h.app,
        "/top-words",
        json!({"bucket_name": "b", "file_path": "a.txt"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"top_10_words": [
            {"word": "the", "count": 3},
            {"word": "cat", "count": 2},
            {"word": "sat", "count": 1},
            {"word": "on", "count": 1},
            {"word": "mat", "count": 1},
            {"word": "ran", "count": 1}
        ]})
    );
}

#[tokio::test]
async fn missing_file_path_is_400() {
    let h = harness();
    let (status, body) = post(&h.app, "/top-words", json!({"bucket_name": "b"}).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing bucket_name or file_path");
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_json_is_400() {
    let h = harness();
    for payload in ["not json", "[]", "{}"] {
        let (status, body) = post(&h.app, "/word-count", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(body["error"], "Invalid JSON payload");
    }
}

#[tokio::test]
async fn missing_object_is_404() {
    let h = harness();
    let (status, body) = post(
        &h.app,
        "/word-count",
        json!({"bucket_name": "b", "file_path": "gone.txt"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn load_is_idempotent() {
    let h = harness();
    for _ in 0..2 {
        let (status, body) = post(&h.app, "/load", load_body().to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "success"}));
    }
    assert_eq!(h.warehouse.len(), 1);
}

#[tokio::test]
async fn numeric_generation_keys_the_same_row() {
    let h = harness();
    let mut numeric = load_body();
    numeric["generation"] = json!(1);

    let (status, body) = post(&h.app, "/load", numeric.to_string()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (status, _) = post(&h.app, "/load", load_body().to_string()).await;
    assert_eq!(status, StatusCode::OK);

    let rows = h.warehouse.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].generation.as_deref(), Some("1"));
}

#[tokio::test]
async fn load_lists_missing_fields() {
    let h = harness();
    let mut body = load_body();
    body.as_object_mut().unwrap().remove("bucket");
    body.as_object_mut().unwrap().remove("total_words");

    let (status, body) = post(&h.app, "/load", body.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing required fields in payload: bucket, total_words"
    );
    assert!(h.warehouse.is_empty());
}

#[tokio::test]
async fn load_rejects_irregular_top_words() {
    let h = harness();
    let mut body = load_body();
    body["top_10_words"] = json!("the:3 cat:2");

    let (status, body) = post(&h.app, "/load", body.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn upload_event_starts_one_workflow() {
    let h = harness();
    let event = json!({
        "bucket": "b",
        "name": "a.txt",
        "generation": "1718006400000000",
        "size": "34",
        "timeCreated": "2024-06-10T08:00:00.000Z"
    });

    let (status, body) = post(&h.app, "/events/upload", event.to_string()).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "started");

    let started = h.starter.started();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].0, "file-processing-workflow");
    assert_eq!(started[0].1["file_path"], "a.txt");
    assert_eq!(started[0].1["bucket_name"], "b");
    assert_eq!(started[0].1["size_bytes"], 34);
}

#[tokio::test]
async fn folder_upload_is_skipped() {
    let h = harness();
    let (status, body) = post(
        &h.app,
        "/events/upload",
        json!({"bucket": "b", "name": "folder/"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "skipped", "reason": "directory_marker"}));
    assert!(h.starter.started().is_empty());
}

#[tokio::test]
async fn workflow_run_reports_completion() {
    let h = harness();
    let (status, body) = post(
        &h.app,
        "/workflows/run",
        json!({"bucket_name": "b", "file_path": "a.txt", "size_bytes": 34}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "completed");
    assert_eq!(body["result"]["total_words"], 9);
    assert_eq!(body["result"]["size_bytes"], 34);
    assert_eq!(
        body["trace"],
        json!(["started", "awaiting_analysis", "merging", "loading", "completed"])
    );
    assert_eq!(h.warehouse.len(), 1);
}

#[tokio::test]
async fn workflow_run_failure_carries_error() {
    let h = harness();
    let (status, body) = post(
        &h.app,
        "/workflows/run",
        json!({"bucket_name": "b", "file_path": "gone.txt"}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["state"], "failed");
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(h.warehouse.is_empty());
}

#[tokio::test]
async fn probes_answer() {
    let h = harness();
    let (status, body) = get(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&h.app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["components"]["warehouse"], "memory");
    assert_eq!(body["components"]["workflow"], "file-processing-workflow");
    assert!(body["components"]["workflows_in_flight"].is_null());

    let (status, body) = get(&h.app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Wordstat Server");
}

#[tokio::test]
async fn unknown_route_is_404_with_error_body() {
    let h = harness();
    let (status, body) = get(&h.app, "/api/v1/process").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found", "code": "NOT_FOUND"}));
}

#[tokio::test]
async fn request_id_is_echoed() {
    let h = harness();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}
