// ABOUTME: Store contracts for todos and subtasks
// ABOUTME: Implemented over SQLite in production and mocked in pipeline tests

use async_trait::async_trait;
use tasklane_core::LimitOffset;
use tasklane_storage::StorageResult;
use uuid::Uuid;

use crate::types::{NewSubTask, NewTodo, NewTodoTree, SubTask, TaskChanges, Todo, TodoQuery};

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn get_by_id(&self, todo_id: Uuid) -> StorageResult<Option<Todo>>;

    async fn exists(&self, todo_id: Uuid) -> StorageResult<bool>;

    /// One page of todos, newest first, plus the total count matching `query`
    async fn list(&self, query: TodoQuery, page: LimitOffset) -> StorageResult<(Vec<Todo>, u64)>;

    async fn create(&self, input: NewTodo) -> StorageResult<Todo>;

    /// `None` when no todo has this id
    async fn update(&self, todo_id: Uuid, changes: TaskChanges) -> StorageResult<Option<Todo>>;

    /// Returns whether a row was removed
    async fn delete(&self, todo_id: Uuid) -> StorageResult<bool>;

    /// Insert every item in one transaction, `chunk_size` rows per statement.
    /// The result is in input order.
    async fn bulk_create(&self, items: Vec<NewTodo>, chunk_size: usize) -> StorageResult<Vec<Todo>>;

    /// Insert todos and their subtasks in a single transaction. Nothing is
    /// written if any row fails. Todos come back in input order with their
    /// subtasks attached.
    async fn bulk_create_with_subtasks(
        &self,
        items: Vec<NewTodoTree>,
        chunk_size: usize,
    ) -> StorageResult<Vec<Todo>>;
}

#[async_trait]
pub trait SubTaskStore: Send + Sync {
    async fn get_by_id(&self, todo_id: Uuid, subtask_id: Uuid) -> StorageResult<Option<SubTask>>;

    /// Subtasks of one todo, oldest first
    async fn list_by_todo(&self, todo_id: Uuid) -> StorageResult<Vec<SubTask>>;

    /// Fails with `NotFound` when the parent todo does not exist
    async fn create(&self, input: NewSubTask) -> StorageResult<SubTask>;

    /// `NotFound` when the parent is gone, `None` when only the subtask is
    async fn update(
        &self,
        todo_id: Uuid,
        subtask_id: Uuid,
        changes: TaskChanges,
    ) -> StorageResult<Option<SubTask>>;

    /// `NotFound` when the parent is gone. Returns whether a row was removed.
    async fn delete(&self, todo_id: Uuid, subtask_id: Uuid) -> StorageResult<bool>;

    async fn bulk_create(
        &self,
        items: Vec<NewSubTask>,
        chunk_size: usize,
    ) -> StorageResult<Vec<SubTask>>;
}
