use tasklane_core::format_size;
use tasklane_operations::TrackerError;
use tasklane_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File too large (max {})", format_size(*.limit))]
    FileTooLarge { limit: u64 },
    #[error("row {line}: {message}")]
    Parse { line: u64, message: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bulk insert returned {actual} todos for {expected} groups")]
    Mismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

pub type ImportResult<T> = Result<T, ImportError>;

impl ImportError {
    pub(crate) fn parse(line: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
