// ABOUTME: Common test utilities for API integration tests
// ABOUTME: Provides test server setup, background draining, and HTTP client helpers

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tasklane_api::{create_router, AppState};
use tasklane_imports::ImportSettings;
use tasklane_operations::{OperationStatus, WebhookNotifier};
use tasklane_storage::connect_in_memory;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

/// Webhook stand-in for tests that only look at stored state
pub struct NoopNotifier;

#[async_trait]
impl WebhookNotifier for NoopNotifier {
    async fn notify(&self, _operation_id: Uuid, _from: OperationStatus, _to: OperationStatus) {}
}

/// Test context containing server URL, database pool, and background tracker
pub struct TestContext {
    pub base_url: String,
    pub pool: SqlitePool,
    pub background: TaskTracker,
}

impl TestContext {
    /// Wait for every detached import started so far
    pub async fn drain_background(&self) {
        self.background.close();
        self.background.wait().await;
    }
}

pub async fn setup_test_server() -> TestContext {
    setup_test_server_with(ImportSettings::default()).await
}

/// Create a test server over an isolated in-memory database
pub async fn setup_test_server_with(settings: ImportSettings) -> TestContext {
    let pool = connect_in_memory()
        .await
        .expect("Failed to create database pool");
    let background = TaskTracker::new();

    let state = AppState::new(
        pool.clone(),
        Arc::new(NoopNotifier),
        background.clone(),
        settings,
    );
    let app = create_router(state);

    // Bind to random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestContext {
        base_url,
        pool,
        background,
    }
}

/// Helper to make GET requests
pub async fn get(base_url: &str, path: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("{}{}", base_url, path))
        .send()
        .await
        .expect("Failed to make GET request")
}

/// Helper to make POST requests with JSON body
pub async fn post_json<T: serde::Serialize>(
    base_url: &str,
    path: &str,
    body: &T,
) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}{}", base_url, path))
        .json(body)
        .send()
        .await
        .expect("Failed to make POST request")
}

/// Helper to make PUT requests with JSON body
pub async fn put_json<T: serde::Serialize>(
    base_url: &str,
    path: &str,
    body: &T,
) -> reqwest::Response {
    reqwest::Client::new()
        .put(format!("{}{}", base_url, path))
        .json(body)
        .send()
        .await
        .expect("Failed to make PUT request")
}

/// Helper to make DELETE requests
pub async fn delete(base_url: &str, path: &str) -> reqwest::Response {
    reqwest::Client::new()
        .delete(format!("{}{}", base_url, path))
        .send()
        .await
        .expect("Failed to make DELETE request")
}

/// Upload `contents` as the multipart `file` field of POST /todos/import
pub async fn upload_csv(base_url: &str, contents: Vec<u8>) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(contents)
        .file_name("todos.csv")
        .mime_str("text/csv")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);

    reqwest::Client::new()
        .post(format!("{}/todos/import", base_url))
        .multipart(form)
        .send()
        .await
        .expect("Failed to upload CSV")
}

/// Create a todo through the API and return its id
pub async fn create_todo(base_url: &str, title: &str) -> String {
    let response = post_json(base_url, "/todos", &serde_json::json!({ "title": title })).await;
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["todo_id"].as_str().unwrap().to_string()
}
