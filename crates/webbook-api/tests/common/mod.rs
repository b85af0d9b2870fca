//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;
use webbook_core::policy::IngestPolicy;
use webbook_core::secret::SharedSecret;
use webbook_event_store::{SqliteEventRepository, open_or_create_store};
use webbook_test_support::fixtures::{TEST_INSTANCE, TEST_SECRET};

use webbook_api::config::DEFAULT_BODY_LIMIT_BYTES;
use webbook_api::metrics::Metrics;
use webbook_api::routes;
use webbook_api::state::AppState;

/// A router over a fresh store file. The directory lives as long as the
/// value does.
pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    _dir: TempDir,
}

/// Build the full app router over a real SQLite store, the same way
/// `main.rs` does.
pub async fn build_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let pool = open_or_create_store(dir.path().join("webbook.db"))
        .await
        .unwrap();

    let app_state = AppState::new(
        Arc::new(SqliteEventRepository::new(pool.clone())),
        Arc::new(Metrics::new().unwrap()),
        SharedSecret::new(TEST_SECRET),
        IngestPolicy::default(),
        DEFAULT_BODY_LIMIT_BYTES,
    );

    TestApp {
        app: routes::router().with_state(app_state),
        pool,
        _dir: dir,
    }
}

/// A GitLab-style delivery carrying every required header.
pub fn gitlab_request(token: &str, event_uuid: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "GitLab/17.0.0")
        .header("X-Gitlab-Instance", TEST_INSTANCE)
        .header("X-Gitlab-Event", "Pipeline Hook")
        .header("X-Gitlab-Token", token)
        .header("X-Gitlab-Event-UUID", event_uuid)
        .body(body.into())
        .unwrap()
}

/// Send a request and decode the JSON response body.
pub async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// POST a signed delivery and return the response.
pub async fn post_webhook(
    app: Router,
    event_uuid: &str,
    body: impl Into<Body>,
) -> (StatusCode, serde_json::Value) {
    send_json(app, gitlab_request(TEST_SECRET, event_uuid, body)).await
}

/// Send a GET request and return the status, content type and body text.
pub async fn get_text(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_owned());
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, content_type, String::from_utf8(body_bytes.to_vec()).unwrap())
}

/// Number of rows in `relation`.
pub async fn count_rows(pool: &SqlitePool, relation: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {relation}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
