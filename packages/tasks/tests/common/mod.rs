// ABOUTME: Shared helpers for tasks integration tests
// ABOUTME: Builds stores and services over a migrated in-memory database

use std::sync::Arc;

use sqlx::SqlitePool;
use tasklane_storage::connect_in_memory;
use tasklane_tasks::{SubTaskStorage, TaskService, TodoStorage};

pub struct TestStores {
    #[allow(dead_code)]
    pub pool: SqlitePool,
    pub todos: Arc<TodoStorage>,
    pub subtasks: Arc<SubTaskStorage>,
}

pub async fn setup_stores() -> TestStores {
    let pool = connect_in_memory().await.unwrap();
    TestStores {
        todos: Arc::new(TodoStorage::new(pool.clone())),
        subtasks: Arc::new(SubTaskStorage::new(pool.clone())),
        pool,
    }
}

#[allow(dead_code)]
pub async fn setup_service() -> (TaskService, TestStores) {
    let stores = setup_stores().await;
    let service = TaskService::new(stores.todos.clone(), stores.subtasks.clone());
    (service, stores)
}
