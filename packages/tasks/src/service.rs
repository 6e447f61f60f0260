// ABOUTME: CRUD use cases for todos and their subtasks
// ABOUTME: Validates input and turns absent rows into NotFound

use std::sync::Arc;

use tasklane_core::{validate_title, LimitOffset, Page, Status};
use tracing::info;
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};
use crate::store::{SubTaskStore, TodoStore};
use crate::types::{NewSubTask, NewTodo, SubTask, TaskChanges, Todo, TodoQuery};

#[derive(Clone)]
pub struct TaskService {
    todos: Arc<dyn TodoStore>,
    subtasks: Arc<dyn SubTaskStore>,
}

impl TaskService {
    pub fn new(todos: Arc<dyn TodoStore>, subtasks: Arc<dyn SubTaskStore>) -> Self {
        Self { todos, subtasks }
    }

    pub async fn list_todos(&self, query: TodoQuery, page: LimitOffset) -> TaskResult<Page<Todo>> {
        let (items, count) = self.todos.list(query, page).await?;
        Ok(Page::new(items, count, page))
    }

    pub async fn get_todo(&self, todo_id: Uuid) -> TaskResult<Todo> {
        self.todos
            .get_by_id(todo_id)
            .await?
            .ok_or_else(|| TaskError::not_found("Todo", todo_id))
    }

    pub async fn create_todo(&self, title: String) -> TaskResult<Todo> {
        validate_title(&title)?;
        let todo = self.todos.create(NewTodo::new(title)).await?;
        info!(todo_id = %todo.todo_id, "Todo created");
        Ok(todo)
    }

    pub async fn update_todo(&self, todo_id: Uuid, changes: TaskChanges) -> TaskResult<Todo> {
        validate_title(&changes.title)?;
        self.todos
            .update(todo_id, changes)
            .await?
            .ok_or_else(|| TaskError::not_found("Todo", todo_id))
    }

    /// Deleting a todo that does not exist succeeds
    pub async fn delete_todo(&self, todo_id: Uuid) -> TaskResult<()> {
        if self.todos.delete(todo_id).await? {
            info!(todo_id = %todo_id, "Todo deleted");
        }
        Ok(())
    }

    pub async fn list_subtasks(&self, todo_id: Uuid) -> TaskResult<Vec<SubTask>> {
        self.require_todo(todo_id).await?;
        Ok(self.subtasks.list_by_todo(todo_id).await?)
    }

    pub async fn get_subtask(&self, todo_id: Uuid, subtask_id: Uuid) -> TaskResult<SubTask> {
        self.require_todo(todo_id).await?;
        self.subtasks
            .get_by_id(todo_id, subtask_id)
            .await?
            .ok_or_else(|| TaskError::not_found("SubTask", subtask_id))
    }

    pub async fn create_subtask(&self, todo_id: Uuid, title: String) -> TaskResult<SubTask> {
        validate_title(&title)?;

        // Storage checks the parent inside the insert transaction
        let subtask = self
            .subtasks
            .create(NewSubTask {
                todo_id,
                title,
                status: Status::New,
            })
            .await?;
        info!(todo_id = %todo_id, subtask_id = %subtask.subtask_id, "SubTask created");
        Ok(subtask)
    }

    pub async fn update_subtask(
        &self,
        todo_id: Uuid,
        subtask_id: Uuid,
        changes: TaskChanges,
    ) -> TaskResult<SubTask> {
        validate_title(&changes.title)?;
        self.subtasks
            .update(todo_id, subtask_id, changes)
            .await?
            .ok_or_else(|| TaskError::not_found("SubTask", subtask_id))
    }

    /// The parent must exist; a missing subtask is not an error
    pub async fn delete_subtask(&self, todo_id: Uuid, subtask_id: Uuid) -> TaskResult<()> {
        self.subtasks.delete(todo_id, subtask_id).await?;
        Ok(())
    }

    async fn require_todo(&self, todo_id: Uuid) -> TaskResult<()> {
        if self.todos.exists(todo_id).await? {
            Ok(())
        } else {
            Err(TaskError::not_found("Todo", todo_id))
        }
    }
}
