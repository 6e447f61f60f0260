// ABOUTME: Data layer and persistence for Tasklane
// ABOUTME: Owns the storage error type, SQLite pool bootstrap, and schema migrations

pub mod db;
pub mod error;

pub use db::{connect, connect_in_memory};
pub use error::{StorageError, StorageResult};
