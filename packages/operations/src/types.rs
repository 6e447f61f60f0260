// ABOUTME: Operation type definitions
// ABOUTME: Integer-backed lifecycle enums that serialize by name

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a background operation. Stored as an integer, serialized by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    #[default]
    New = 0,
    Started = 1,
    Completed = 2,
    Error = -1,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::New => "NEW",
            OperationStatus::Started => "STARTED",
            OperationStatus::Completed => "COMPLETED",
            OperationStatus::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Error)
    }

    /// NEW -> STARTED -> COMPLETED | ERROR, nothing else
    pub fn can_transition_to(&self, next: OperationStatus) -> bool {
        matches!(
            (self, next),
            (OperationStatus::New, OperationStatus::Started)
                | (OperationStatus::Started, OperationStatus::Completed)
                | (OperationStatus::Started, OperationStatus::Error)
        )
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    ImportTodos = 1,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::ImportTodos => "IMPORT_TODOS",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_id: Uuid,
    pub operation_type: OperationType,
    pub status: OperationStatus,
    /// Empty unless the operation ended in ERROR
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
