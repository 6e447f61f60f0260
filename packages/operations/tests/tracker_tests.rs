// ABOUTME: Integration tests for the operation tracker over SQLite
// ABOUTME: Exercises creation, lookup, and every allowed and refused transition

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tasklane_operations::{
    OperationStatus, OperationStorage, OperationTracker, OperationType, TrackerError,
};
use tasklane_storage::connect_in_memory;
use uuid::Uuid;

async fn setup_tracker() -> OperationTracker {
    let pool = connect_in_memory().await.unwrap();
    OperationTracker::new(Arc::new(OperationStorage::new(pool)))
}

#[tokio::test]
async fn test_create_starts_new_with_empty_reason() {
    let tracker = setup_tracker().await;
    let operation_id = Uuid::new_v4();

    let created = tracker
        .create(operation_id, OperationType::ImportTodos)
        .await
        .unwrap();

    assert_eq!(created.operation_id, operation_id);
    assert_eq!(created.operation_type, OperationType::ImportTodos);
    assert_eq!(created.status, OperationStatus::New);
    assert_eq!(created.reason, "");

    let fetched = tracker.get(operation_id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_success_path_reports_previous_status() {
    let tracker = setup_tracker().await;
    let operation_id = Uuid::new_v4();
    tracker.create(operation_id, OperationType::ImportTodos).await.unwrap();

    let (from, started) = tracker
        .update(operation_id, OperationStatus::Started, "")
        .await
        .unwrap();
    assert_eq!(from, OperationStatus::New);
    assert_eq!(started.status, OperationStatus::Started);

    let (from, completed) = tracker
        .update(operation_id, OperationStatus::Completed, "")
        .await
        .unwrap();
    assert_eq!(from, OperationStatus::Started);
    assert_eq!(completed.status, OperationStatus::Completed);
    assert_eq!(completed.reason, "");
}

#[tokio::test]
async fn test_error_path_records_reason() {
    let tracker = setup_tracker().await;
    let operation_id = Uuid::new_v4();
    tracker.create(operation_id, OperationType::ImportTodos).await.unwrap();
    tracker.update(operation_id, OperationStatus::Started, "").await.unwrap();

    let (from, failed) = tracker
        .update(operation_id, OperationStatus::Error, "row 3: unknown status")
        .await
        .unwrap();

    assert_eq!(from, OperationStatus::Started);
    assert_eq!(failed.status, OperationStatus::Error);
    assert_eq!(failed.reason, "row 3: unknown status");
    assert_eq!(tracker.get(operation_id).await.unwrap().reason, "row 3: unknown status");
}

#[tokio::test]
async fn test_terminal_state_refuses_further_transitions() {
    let tracker = setup_tracker().await;
    let operation_id = Uuid::new_v4();
    tracker.create(operation_id, OperationType::ImportTodos).await.unwrap();
    tracker.update(operation_id, OperationStatus::Started, "").await.unwrap();
    tracker.update(operation_id, OperationStatus::Completed, "").await.unwrap();

    let err = tracker
        .update(operation_id, OperationStatus::Error, "late failure")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TrackerError::InvalidTransition {
            from: OperationStatus::Completed,
            to: OperationStatus::Error,
        }
    ));
    assert_eq!(
        tracker.get(operation_id).await.unwrap().status,
        OperationStatus::Completed
    );
}

#[tokio::test]
async fn test_skipping_started_is_refused() {
    let tracker = setup_tracker().await;
    let operation_id = Uuid::new_v4();
    tracker.create(operation_id, OperationType::ImportTodos).await.unwrap();

    let err = tracker
        .update(operation_id, OperationStatus::Completed, "")
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_missing_operation_is_not_found() {
    let tracker = setup_tracker().await;
    let missing = Uuid::new_v4();

    assert!(matches!(
        tracker.get(missing).await.unwrap_err(),
        TrackerError::NotFound(id) if id == missing
    ));
    assert!(matches!(
        tracker
            .update(missing, OperationStatus::Started, "")
            .await
            .unwrap_err(),
        TrackerError::NotFound(_)
    ));
}
