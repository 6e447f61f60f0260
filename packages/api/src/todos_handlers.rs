// ABOUTME: HTTP request handlers for todo operations
// ABOUTME: CRUD over todos plus the CSV import entry point

use std::io::SeekFrom;

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tasklane_core::{LimitOffset, Page};
use tasklane_tasks::{TaskChanges, Todo, TodoQuery};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiResult, AppError};
use crate::record_todo;
use crate::state::AppState;

/// Multipart field carrying the CSV upload
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct ListTodosParams {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    pub min_subtasks: Option<u32>,
    #[serde(default)]
    pub include_subtasks: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ImportTodosResponse {
    pub operation_id: Uuid,
}

/// List todos, newest first
pub async fn list_todos(
    State(state): State<AppState>,
    params: Result<Query<ListTodosParams>, QueryRejection>,
) -> ApiResult<Json<Page<Todo>>> {
    let Query(params) = params?;
    info!(
        "Listing todos (limit: {}, offset: {})",
        params.limit, params.offset
    );

    let query = TodoQuery {
        min_subtasks: params.min_subtasks,
        include_subtasks: params.include_subtasks,
    };
    let page = state
        .tasks
        .list_todos(query, LimitOffset::new(params.limit, params.offset))
        .await?;
    Ok(Json(page))
}

/// Create a todo in status NEW
pub async fn create_todo(
    State(state): State<AppState>,
    request: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    let Json(request) = request?;
    let todo = state.tasks.create_todo(request.title).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn get_todo(
    State(state): State<AppState>,
    todo_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Todo>> {
    let Path(todo_id) = todo_id?;
    record_todo(todo_id);
    Ok(Json(state.tasks.get_todo(todo_id).await?))
}

pub async fn update_todo(
    State(state): State<AppState>,
    todo_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<TaskChanges>, JsonRejection>,
) -> ApiResult<Json<Todo>> {
    let Path(todo_id) = todo_id?;
    record_todo(todo_id);
    let Json(changes) = request?;
    info!("Updating todo: {}", todo_id);

    Ok(Json(state.tasks.update_todo(todo_id, changes).await?))
}

/// Delete a todo and its subtasks. Missing todos are not an error.
pub async fn delete_todo(
    State(state): State<AppState>,
    todo_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(todo_id) = todo_id?;
    record_todo(todo_id);
    state.tasks.delete_todo(todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accept a CSV upload and schedule its import. Responds once the operation is recorded.
pub async fn import_todos(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ImportTodosResponse>> {
    let mut multipart = multipart?;
    let max_bytes = state.imports.settings().max_bytes;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file = spool_upload(&mut field, max_bytes).await?;
        let operation_id = state.imports.submit(file).await?;
        info!(operation_id = %operation_id, "Import scheduled");

        return Ok(Json(ImportTodosResponse { operation_id }));
    }

    Err(AppError::validation(format!(
        "multipart field '{}' is required",
        UPLOAD_FIELD
    )))
}

/// Copy an upload into an anonymous temp file, stopping one byte past `max_bytes`
/// so the size check can still see that the limit was exceeded.
async fn spool_upload(field: &mut Field<'_>, max_bytes: u64) -> ApiResult<File> {
    let mut file = File::from_std(tempfile::tempfile().map_err(AppError::internal)?);
    let cap = max_bytes.saturating_add(1);
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await? {
        let take = (chunk.len() as u64).min(cap - written) as usize;
        file.write_all(&chunk[..take])
            .await
            .map_err(AppError::internal)?;
        written += take as u64;
        if written >= cap {
            break;
        }
    }

    file.flush().await.map_err(AppError::internal)?;
    file.seek(SeekFrom::Start(0))
        .await
        .map_err(AppError::internal)?;
    Ok(file)
}
