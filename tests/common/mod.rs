//! Shared harness for integration tests: an in-memory database, temp-backed
//! collaborators, and small request helpers driving the router directly.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use campanile::api::{build_router, AppState};
use campanile::config::DatabaseConfig;
use campanile::platform::{EnvFileStore, FsBlobStore};
use campanile::storage::create_pool;

pub struct TestApp {
    pub router: Router,
    // Holds the blob root and env mirror file for the app's lifetime.
    pub dir: TempDir,
}

impl TestApp {
    pub fn env_file(&self) -> std::path::PathBuf {
        self.dir.path().join(".env.gateways")
    }

    pub fn blob_root(&self) -> std::path::PathBuf {
        self.dir.path().join("uploads")
    }
}

pub async fn test_app() -> TestApp {
    // A single connection keeps every query on the same in-memory database.
    let config = DatabaseConfig {
        url: "sqlite://:memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        auto_migrate: true,
        ..Default::default()
    };
    let pool = create_pool(&config).await.expect("test pool");

    let dir = tempfile::tempdir().expect("tempdir");
    let state = AppState::with_collaborators(
        pool,
        Arc::new(FsBlobStore::new(dir.path().join("uploads"), "/uploads")),
        Arc::new(EnvFileStore::new(dir.path().join(".env.gateways"))),
    );

    TestApp { router: build_router(state), dir }
}

pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    send_with_headers(app, method, uri, body, &[]).await
}

/// Send a request as an authenticated actor.
pub async fn send_as(
    app: &TestApp,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    actor_id: i64,
    actor_name: &str,
) -> (StatusCode, serde_json::Value) {
    let id = actor_id.to_string();
    send_with_headers(app, method, uri, body, &[("x-actor-id", &id), ("x-actor-name", actor_name)])
        .await
}

async fn send_with_headers(
    app: &TestApp,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (key, value) in headers {
        builder = builder.header(*key, *value);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    // Extractor rejections answer with plain text rather than the JSON
    // envelope; surface those as a string value so tests can still inspect
    // the status.
    let json = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });

    (status, json)
}
