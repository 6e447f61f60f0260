// ABOUTME: Todo and subtask management for Tasklane
// ABOUTME: Provides the store contracts, SQLite storage, and CRUD use cases

pub mod error;
pub mod service;
pub mod storage;
pub mod store;
pub mod types;

pub use error::{TaskError, TaskResult};
pub use service::TaskService;
pub use storage::{SubTaskStorage, TodoStorage};
pub use store::{SubTaskStore, TodoStore};
pub use types::*;
