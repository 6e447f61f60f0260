use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use tasklane_core::format_size;
use tasklane_imports::ImportError;
use tasklane_operations::TrackerError;
use tasklane_tasks::TaskError;
use thiserror::Error;
use tracing::{error, info};

/// Application error type that all handlers return
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("File too large (max {limit})")]
    FileTooLarge { limit: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error body: a message plus optional machine-readable details
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<HashMap<String, String>>,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Sanitized body for external consumption
    fn to_response_body(&self) -> ErrorResponse {
        match self {
            AppError::NotFound { resource, id } => ErrorResponse {
                message: "Not Found".to_string(),
                details: Some(HashMap::from([(resource.to_string(), id.clone())])),
            },
            AppError::FileTooLarge { limit } => ErrorResponse {
                message: format!("File too large (max {})", limit),
                details: Some(HashMap::from([("max_size".to_string(), limit.clone())])),
            },
            AppError::Validation(msg) => ErrorResponse {
                message: msg.clone(),
                details: None,
            },
            AppError::Internal(_) => ErrorResponse {
                message: "Internal Server Error".to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // Internal details stay in the log
        match &self {
            AppError::Internal(err) => {
                error!(error = %err, "Internal server error occurred");
            }
            _ => {
                info!(status = status_code.as_u16(), error = %self, "API error response");
            }
        }

        (status_code, Json(self.to_response_body())).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound { resource, id } => AppError::NotFound { resource, id },
            TaskError::Validation(msg) => AppError::Validation(msg),
            TaskError::Storage(e) => AppError::internal(e),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::NotFound(id) => AppError::not_found("Operation", id),
            other => AppError::internal(other),
        }
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileTooLarge { limit } => AppError::FileTooLarge {
                limit: format_size(limit),
            },
            other => AppError::internal(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Validation(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};
    use tasklane_storage::StorageError;
    use uuid::Uuid;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_carries_resource_details() {
        let id = Uuid::new_v4();
        let (status, body) = render(TaskError::not_found("Todo", id).into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({ "message": "Not Found", "details": { "Todo": id.to_string() } })
        );
    }

    #[tokio::test]
    async fn test_missing_operation_maps_to_not_found() {
        let id = Uuid::new_v4();
        let (status, body) = render(TrackerError::NotFound(id).into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["details"]["Operation"], json!(id.to_string()));
    }

    #[tokio::test]
    async fn test_file_too_large_reports_limit() {
        let err: AppError = ImportError::FileTooLarge {
            limit: 5 * 1024 * 1024,
        }
        .into();
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body,
            json!({ "message": "File too large (max 5MB)", "details": { "max_size": "5MB" } })
        );
    }

    #[tokio::test]
    async fn test_validation_is_unprocessable() {
        let (status, body) =
            render(TaskError::Validation("title must not be empty".to_string()).into()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, json!({ "message": "title must not be empty" }));
    }

    #[tokio::test]
    async fn test_storage_failure_hides_details() {
        let err: AppError =
            TaskError::Storage(StorageError::InvalidData("secret table".to_string())).into();
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Internal Server Error" }));
    }
}
