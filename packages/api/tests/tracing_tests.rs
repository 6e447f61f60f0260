// ABOUTME: Tests for the request span fields recorded by handlers
// ABOUTME: Captures span records with a local subscriber and drives the router in-process

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tasklane_api::{create_router, AppState};
use tasklane_imports::ImportSettings;
use tasklane_storage::connect_in_memory;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::span::{Id, Record};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

mod common;
use common::NoopNotifier;

type Recorded = Arc<Mutex<Vec<(String, String)>>>;

/// Collects every field recorded onto a span after creation
struct RecordedFields(Recorded);

impl<S: Subscriber> Layer<S> for RecordedFields {
    fn on_record(&self, _id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        values.record(&mut FieldVisitor(&self.0));
    }
}

struct FieldVisitor<'a>(&'a Mutex<Vec<(String, String)>>);

impl Visit for FieldVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.0
            .lock()
            .unwrap()
            .push((field.name().to_string(), format!("{:?}", value)));
    }
}

async fn router() -> Router {
    let pool = connect_in_memory().await.unwrap();
    create_router(AppState::new(
        pool,
        Arc::new(NoopNotifier),
        TaskTracker::new(),
        ImportSettings::default(),
    ))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn values_of(recorded: &Recorded, name: &str) -> Vec<String> {
    recorded
        .lock()
        .unwrap()
        .iter()
        .filter(|(field, _)| field == name)
        .map(|(_, value)| value.clone())
        .collect()
}

#[tokio::test]
async fn test_subtask_handlers_tag_request_span_with_ids() {
    let recorded: Recorded = Arc::default();
    let subscriber = tracing_subscriber::registry().with(RecordedFields(recorded.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = router().await;
    let (status, todo) = send(&app, "POST", "/todos", Some(json!({ "title": "Parent" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let todo_id = todo["todo_id"].as_str().unwrap().to_string();

    let (status, subtask) = send(
        &app,
        "POST",
        &format!("/todos/{}/subtasks", todo_id),
        Some(json!({ "title": "Child" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let subtask_id = subtask["subtask_id"].as_str().unwrap().to_string();

    recorded.lock().unwrap().clear();
    let (status, _) = send(
        &app,
        "GET",
        &format!("/todos/{}/subtasks/{}", todo_id, subtask_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(values_of(&recorded, "todo_id"), vec![todo_id]);
    assert_eq!(values_of(&recorded, "subtask_id"), vec![subtask_id]);
}

#[tokio::test]
async fn test_todo_handlers_tag_request_span_even_when_missing() {
    let recorded: Recorded = Arc::default();
    let subscriber = tracing_subscriber::registry().with(RecordedFields(recorded.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = router().await;
    let missing = uuid::Uuid::new_v4().to_string();
    let (status, _) = send(&app, "GET", &format!("/todos/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(values_of(&recorded, "todo_id"), vec![missing]);
    assert!(values_of(&recorded, "subtask_id").is_empty());
}
