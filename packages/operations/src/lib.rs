// ABOUTME: Background operation tracking for Tasklane
// ABOUTME: Operation lifecycle state machine, SQLite storage, and webhook notification

pub mod storage;
pub mod store;
pub mod tracker;
pub mod types;
pub mod webhook;

pub use storage::OperationStorage;
pub use store::OperationStore;
pub use tracker::{OperationTracker, TrackerError, TrackerResult};
pub use types::{Operation, OperationStatus, OperationType};
pub use webhook::{notify_in_background, HttpWebhookNotifier, WebhookNotifier, WebhookPayload};
