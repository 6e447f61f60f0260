// ABOUTME: HTTP API layer for Tasklane
// ABOUTME: Routes todo, subtask, import, and operation requests to their use cases

pub mod error;
mod health;
mod operations_handlers;
mod subtasks_handlers;
mod todos_handlers;
pub mod state;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{field, info_span, Level, Span};
use uuid::Uuid;

pub use error::{ApiResult, AppError};
pub use state::AppState;

/// Build the complete API router with request tracing
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .merge(create_todos_router())
        .route(
            "/operations/{operation_id}",
            get(operations_handlers::get_operation),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Todo, subtask, and import routes
pub fn create_todos_router() -> Router<AppState> {
    Router::new()
        .route(
            "/todos",
            get(todos_handlers::list_todos).post(todos_handlers::create_todo),
        )
        // Uploads are size-checked while spooling, not by the default body cap
        .route(
            "/todos/import",
            post(todos_handlers::import_todos).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/todos/{todo_id}",
            get(todos_handlers::get_todo)
                .put(todos_handlers::update_todo)
                .delete(todos_handlers::delete_todo),
        )
        .route(
            "/todos/{todo_id}/subtasks",
            get(subtasks_handlers::list_subtasks).post(subtasks_handlers::create_subtask),
        )
        .route(
            "/todos/{todo_id}/subtasks/{subtask_id}",
            get(subtasks_handlers::get_subtask)
                .put(subtasks_handlers::update_subtask)
                .delete(subtasks_handlers::delete_subtask),
        )
}

fn make_request_span(request: &Request<Body>) -> Span {
    info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
        todo_id = field::Empty,
        subtask_id = field::Empty,
    )
}

/// Tag the request span with the todo a handler addresses
pub(crate) fn record_todo(todo_id: Uuid) {
    Span::current().record("todo_id", field::display(todo_id));
}

pub(crate) fn record_subtask(todo_id: Uuid, subtask_id: Uuid) {
    let span = Span::current();
    span.record("todo_id", field::display(todo_id));
    span.record("subtask_id", field::display(subtask_id));
}
