use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use tasklane_operations::Operation;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// Current state of a background operation
pub async fn get_operation(
    State(state): State<AppState>,
    operation_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Operation>> {
    let Path(operation_id) = operation_id?;
    Ok(Json(state.operations.get(operation_id).await?))
}
