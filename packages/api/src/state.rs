// ABOUTME: Shared application state for API handlers
// ABOUTME: Wires SQLite stores into the task service, operation tracker, and import pipeline

use std::sync::Arc;

use sqlx::SqlitePool;
use tasklane_imports::{ImportPipeline, ImportSettings};
use tasklane_operations::{OperationStorage, OperationTracker, WebhookNotifier};
use tasklane_tasks::{SubTaskStorage, SubTaskStore, TaskService, TodoStorage, TodoStore};
use tokio_util::task::TaskTracker;

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    pub operations: OperationTracker,
    pub imports: ImportPipeline,
}

impl AppState {
    /// `background` owns every detached import so the server can drain it on shutdown
    pub fn new(
        pool: SqlitePool,
        notifier: Arc<dyn WebhookNotifier>,
        background: TaskTracker,
        settings: ImportSettings,
    ) -> Self {
        let todos: Arc<dyn TodoStore> = Arc::new(TodoStorage::new(pool.clone()));
        let subtasks: Arc<dyn SubTaskStore> = Arc::new(SubTaskStorage::new(pool.clone()));
        let operations = OperationTracker::new(Arc::new(OperationStorage::new(pool)));

        let imports = ImportPipeline::new(
            todos.clone(),
            operations.clone(),
            notifier,
            background,
            settings,
        );

        Self {
            tasks: TaskService::new(todos, subtasks),
            operations,
            imports,
        }
    }
}
