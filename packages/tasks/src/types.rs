// ABOUTME: Todo and subtask type definitions
// ABOUTME: Entities returned by storage plus the inputs used to create and change them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasklane_core::Status;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub todo_id: Uuid,
    pub title: String,
    pub status: Status,
    /// Number of subtasks at read time
    pub subtask_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only populated when the caller asked for eager loading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<SubTask>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    pub subtask_id: Uuid,
    pub todo_id: Uuid,
    pub title: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub status: Status,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: Status::New,
        }
    }

    pub fn with_status(title: impl Into<String>, status: Status) -> Self {
        Self {
            title: title.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubTask {
    pub todo_id: Uuid,
    pub title: String,
    pub status: Status,
}

/// A todo plus the subtasks written with it in one transaction. Subtask
/// parents are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodoTree {
    pub todo: NewTodo,
    pub subtasks: Vec<NewTodo>,
}

/// Replacement values for an update. Both fields are always written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskChanges {
    pub title: String,
    pub status: Status,
}

/// Filters for listing todos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TodoQuery {
    /// Only todos with at least this many subtasks
    #[serde(default)]
    pub min_subtasks: Option<u32>,
    /// Attach each todo's subtasks to the result
    #[serde(default)]
    pub include_subtasks: bool,
}
