// ABOUTME: Shared helpers for import pipeline integration tests
// ABOUTME: In-memory stores, upload files, and mock collaborators

#![allow(dead_code)]

use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use sqlx::SqlitePool;
use tasklane_core::LimitOffset;
use tasklane_imports::{ImportPipeline, ImportSettings};
use tasklane_operations::{
    OperationStatus, OperationStorage, OperationTracker, WebhookNotifier,
};
use tasklane_storage::{connect_in_memory, StorageResult};
use tasklane_tasks::{
    NewTodo, NewTodoTree, TaskChanges, Todo, TodoQuery, TodoStorage, TodoStore,
};
use tokio::fs::File;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

mock! {
    pub Notifier {}

    #[async_trait]
    impl WebhookNotifier for Notifier {
        async fn notify(&self, operation_id: Uuid, from: OperationStatus, to: OperationStatus);
    }
}

mock! {
    pub TodoStore {}

    #[async_trait]
    impl TodoStore for TodoStore {
        async fn get_by_id(&self, todo_id: Uuid) -> StorageResult<Option<Todo>>;
        async fn exists(&self, todo_id: Uuid) -> StorageResult<bool>;
        async fn list(&self, query: TodoQuery, page: LimitOffset) -> StorageResult<(Vec<Todo>, u64)>;
        async fn create(&self, input: NewTodo) -> StorageResult<Todo>;
        async fn update(&self, todo_id: Uuid, changes: TaskChanges) -> StorageResult<Option<Todo>>;
        async fn delete(&self, todo_id: Uuid) -> StorageResult<bool>;
        async fn bulk_create(&self, items: Vec<NewTodo>, chunk_size: usize) -> StorageResult<Vec<Todo>>;
        async fn bulk_create_with_subtasks(&self, items: Vec<NewTodoTree>, chunk_size: usize) -> StorageResult<Vec<Todo>>;
    }
}

pub struct Harness {
    pub pool: SqlitePool,
    pub todos: Arc<TodoStorage>,
    pub tracker: OperationTracker,
    pub tasks: TaskTracker,
}

impl Harness {
    pub async fn new() -> Self {
        let pool = connect_in_memory().await.unwrap();
        Self {
            todos: Arc::new(TodoStorage::new(pool.clone())),
            tracker: OperationTracker::new(Arc::new(OperationStorage::new(pool.clone()))),
            tasks: TaskTracker::new(),
            pool,
        }
    }

    pub fn pipeline(
        &self,
        notifier: Arc<dyn WebhookNotifier>,
        settings: ImportSettings,
    ) -> ImportPipeline {
        self.pipeline_with_todos(self.todos.clone(), notifier, settings)
    }

    pub fn pipeline_with_todos(
        &self,
        todos: Arc<dyn TodoStore>,
        notifier: Arc<dyn WebhookNotifier>,
        settings: ImportSettings,
    ) -> ImportPipeline {
        ImportPipeline::new(
            todos,
            self.tracker.clone(),
            notifier,
            self.tasks.clone(),
            settings,
        )
    }

    /// Make every subtask INSERT abort, as a constraint failure would
    pub async fn reject_subtask_inserts(&self) {
        sqlx::query(
            "CREATE TRIGGER reject_subtasks BEFORE INSERT ON subtasks \
             BEGIN SELECT RAISE(ABORT, 'subtask insert rejected'); END",
        )
        .execute(&self.pool)
        .await
        .unwrap();
    }

    /// Wait for every detached import to finish
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn all_todos(&self) -> Vec<Todo> {
        let query = TodoQuery {
            min_subtasks: None,
            include_subtasks: true,
        };
        self.todos
            .list(query, LimitOffset::default())
            .await
            .unwrap()
            .0
    }
}

/// Anonymous temp file holding `contents`, positioned at the start
pub fn csv_file(contents: &str) -> File {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    File::from_std(file)
}
