// ABOUTME: HTTP request handlers for subtask operations
// ABOUTME: Subtasks are always addressed through their parent todo

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tasklane_tasks::{SubTask, TaskChanges};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::{record_subtask, record_todo};

#[derive(Debug, Deserialize)]
pub struct CreateSubTaskRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ListSubTasksResponse {
    pub subtasks: Vec<SubTask>,
}

/// List a todo's subtasks, oldest first
pub async fn list_subtasks(
    State(state): State<AppState>,
    todo_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ListSubTasksResponse>> {
    let Path(todo_id) = todo_id?;
    record_todo(todo_id);
    let subtasks = state.tasks.list_subtasks(todo_id).await?;
    Ok(Json(ListSubTasksResponse { subtasks }))
}

pub async fn create_subtask(
    State(state): State<AppState>,
    todo_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<CreateSubTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubTask>)> {
    let Path(todo_id) = todo_id?;
    record_todo(todo_id);
    let Json(request) = request?;
    info!("Creating subtask for todo: {}", todo_id);

    let subtask = state.tasks.create_subtask(todo_id, request.title).await?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

pub async fn get_subtask(
    State(state): State<AppState>,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<Json<SubTask>> {
    let Path((todo_id, subtask_id)) = ids?;
    record_subtask(todo_id, subtask_id);
    Ok(Json(state.tasks.get_subtask(todo_id, subtask_id).await?))
}

pub async fn update_subtask(
    State(state): State<AppState>,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
    request: Result<Json<TaskChanges>, JsonRejection>,
) -> ApiResult<Json<SubTask>> {
    let Path((todo_id, subtask_id)) = ids?;
    record_subtask(todo_id, subtask_id);
    let Json(changes) = request?;

    let subtask = state
        .tasks
        .update_subtask(todo_id, subtask_id, changes)
        .await?;
    Ok(Json(subtask))
}

pub async fn delete_subtask(
    State(state): State<AppState>,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path((todo_id, subtask_id)) = ids?;
    record_subtask(todo_id, subtask_id);
    state.tasks.delete_subtask(todo_id, subtask_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
