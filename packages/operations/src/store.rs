use async_trait::async_trait;
use tasklane_storage::StorageResult;
use uuid::Uuid;

use crate::types::{Operation, OperationStatus, OperationType};

#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Insert a NEW operation under a caller-chosen id
    async fn create(&self, operation_id: Uuid, operation_type: OperationType) -> StorageResult<Operation>;

    async fn get_by_id(&self, operation_id: Uuid) -> StorageResult<Option<Operation>>;

    /// Set `status` and `reason` only while the row is still in `from`.
    /// `None` when no row matched.
    async fn update(
        &self,
        operation_id: Uuid,
        from: OperationStatus,
        to: OperationStatus,
        reason: &str,
    ) -> StorageResult<Option<Operation>>;
}
