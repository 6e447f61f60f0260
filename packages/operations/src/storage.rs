// ABOUTME: Operation storage layer using SQLite
// ABOUTME: Persists operation records and guarded status transitions

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tasklane_core::utcnow;
use tasklane_storage::{StorageError, StorageResult};
use tracing::debug;
use uuid::Uuid;

use crate::store::OperationStore;
use crate::types::{Operation, OperationStatus, OperationType};

const OPERATION_COLUMNS: &str =
    "operation_id, operation_type, status, reason, created_at, updated_at";

pub struct OperationStorage {
    pool: SqlitePool,
}

impl OperationStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_operation(row: &SqliteRow) -> StorageResult<Operation> {
        Ok(Operation {
            operation_id: row.try_get("operation_id")?,
            operation_type: row.try_get("operation_type")?,
            status: row.try_get("status")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl OperationStore for OperationStorage {
    async fn create(&self, operation_id: Uuid, operation_type: OperationType) -> StorageResult<Operation> {
        let now = utcnow();

        debug!("Creating operation: {} ({})", operation_id, operation_type);

        let row = sqlx::query(&format!(
            "INSERT INTO operations (operation_id, operation_type, status, reason, created_at, updated_at) \
             VALUES (?, ?, ?, '', ?, ?) RETURNING {OPERATION_COLUMNS}"
        ))
        .bind(operation_id)
        .bind(operation_type)
        .bind(OperationStatus::New)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Self::row_to_operation(&row)
    }

    async fn get_by_id(&self, operation_id: Uuid) -> StorageResult<Option<Operation>> {
        debug!("Fetching operation: {}", operation_id);

        let row = sqlx::query(&format!(
            "SELECT {OPERATION_COLUMNS} FROM operations WHERE operation_id = ?"
        ))
        .bind(operation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        row.as_ref().map(Self::row_to_operation).transpose()
    }

    async fn update(
        &self,
        operation_id: Uuid,
        from: OperationStatus,
        to: OperationStatus,
        reason: &str,
    ) -> StorageResult<Option<Operation>> {
        debug!("Updating operation: {} ({} -> {})", operation_id, from, to);

        let row = sqlx::query(&format!(
            "UPDATE operations SET status = ?, reason = ?, updated_at = ? \
             WHERE operation_id = ? AND status = ? RETURNING {OPERATION_COLUMNS}"
        ))
        .bind(to)
        .bind(reason)
        .bind(utcnow())
        .bind(operation_id)
        .bind(from)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        row.as_ref().map(Self::row_to_operation).transpose()
    }
}
