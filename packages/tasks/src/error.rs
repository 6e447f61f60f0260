use tasklane_core::TitleError;
use tasklane_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(StorageError),
}

pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

impl From<StorageError> for TaskError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { resource, id } => Self::NotFound { resource, id },
            other => Self::Storage(other),
        }
    }
}

impl From<TitleError> for TaskError {
    fn from(err: TitleError) -> Self {
        Self::Validation(err.to_string())
    }
}
