// ABOUTME: Operation lifecycle state machine
// ABOUTME: Creates operations and applies validated status transitions

use std::sync::Arc;

use tasklane_storage::StorageError;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::store::OperationStore;
use crate::types::{Operation, OperationStatus, OperationType};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Operation not found: {0}")]
    NotFound(Uuid),
    #[error("Invalid operation transition: {from} -> {to}")]
    InvalidTransition {
        from: OperationStatus,
        to: OperationStatus,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Clone)]
pub struct OperationTracker {
    store: Arc<dyn OperationStore>,
}

impl OperationTracker {
    pub fn new(store: Arc<dyn OperationStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        operation_id: Uuid,
        operation_type: OperationType,
    ) -> TrackerResult<Operation> {
        let operation = self.store.create(operation_id, operation_type).await?;
        info!(operation_id = %operation_id, operation_type = %operation_type, "Operation created");
        Ok(operation)
    }

    pub async fn get(&self, operation_id: Uuid) -> TrackerResult<Operation> {
        self.store
            .get_by_id(operation_id)
            .await?
            .ok_or(TrackerError::NotFound(operation_id))
    }

    /// Move an operation to `new_status`, returning the status it left and the stored result
    pub async fn update(
        &self,
        operation_id: Uuid,
        new_status: OperationStatus,
        reason: &str,
    ) -> TrackerResult<(OperationStatus, Operation)> {
        let current = self.get(operation_id).await?;
        let from_status = current.status;

        if !from_status.can_transition_to(new_status) {
            return Err(TrackerError::InvalidTransition {
                from: from_status,
                to: new_status,
            });
        }

        // The guarded write misses only if another writer moved the row first
        let updated = match self
            .store
            .update(operation_id, from_status, new_status, reason)
            .await?
        {
            Some(operation) => operation,
            None => {
                let latest = self.get(operation_id).await?;
                return Err(TrackerError::InvalidTransition {
                    from: latest.status,
                    to: new_status,
                });
            }
        };

        info!(
            operation_id = %operation_id,
            from = %from_status,
            to = %new_status,
            "Operation status updated"
        );
        Ok((from_status, updated))
    }
}
