// ABOUTME: Background import of todos and subtasks from an uploaded CSV file
// ABOUTME: Validates and registers the upload in-request, then persists it on a detached task

use std::io::SeekFrom;
use std::sync::Arc;

use tasklane_core::{new_id, BULK_SIZE_LIMIT, MAX_IMPORT_BYTES};
use tasklane_operations::{
    notify_in_background, OperationStatus, OperationTracker, OperationType, TrackerResult,
    WebhookNotifier,
};
use tasklane_tasks::{NewTodo, NewTodoTree, TodoStore};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tokio_util::task::TaskTracker;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{ImportError, ImportResult};
use crate::parser::{group_rows, read_rows};

/// Longest failure reason stored on an operation
const MAX_REASON_CHARS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    /// Uploads must be strictly smaller than this many bytes
    pub max_bytes: u64,
    /// Rows per INSERT statement during bulk creation
    pub chunk_size: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMPORT_BYTES,
            chunk_size: BULK_SIZE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub todos: usize,
    pub subtasks: usize,
}

#[derive(Clone)]
pub struct ImportPipeline {
    todos: Arc<dyn TodoStore>,
    tracker: OperationTracker,
    notifier: Arc<dyn WebhookNotifier>,
    tasks: TaskTracker,
    settings: ImportSettings,
}

impl ImportPipeline {
    pub fn new(
        todos: Arc<dyn TodoStore>,
        tracker: OperationTracker,
        notifier: Arc<dyn WebhookNotifier>,
        tasks: TaskTracker,
        settings: ImportSettings,
    ) -> Self {
        Self {
            todos,
            tracker,
            notifier,
            tasks,
            settings,
        }
    }

    pub fn settings(&self) -> ImportSettings {
        self.settings
    }

    /// Reject oversized uploads, record a NEW operation, and hand the file to a
    /// background task. Returns as soon as the operation row exists.
    pub async fn submit(&self, mut file: File) -> ImportResult<Uuid> {
        check_size(&mut file, self.settings.max_bytes).await?;

        let operation_id = new_id();
        self.tracker
            .create(operation_id, OperationType::ImportTodos)
            .await?;

        let span = info_span!("import_todos", operation_id = %operation_id);
        self.tasks
            .spawn(self.clone().run(operation_id, file).instrument(span));

        Ok(operation_id)
    }

    /// Drive one operation from NEW to a terminal state. Never fails: problems
    /// end up in the operation's reason or in the log.
    pub async fn run(self, operation_id: Uuid, file: File) {
        if let Err(e) = self
            .transition(operation_id, OperationStatus::Started, "")
            .await
        {
            error!(operation_id = %operation_id, error = %e, "Import aborted before start");
            return;
        }

        let (status, reason) = match self.import(file).await {
            Ok(summary) => {
                info!(
                    todos = summary.todos,
                    subtasks = summary.subtasks,
                    "Import completed"
                );
                (OperationStatus::Completed, String::new())
            }
            Err(e) => {
                warn!(error = %e, "Import failed");
                (OperationStatus::Error, truncate_reason(&e.to_string()))
            }
        };

        // The outcome report runs detached on the same tracker, so shutdown still drains it
        match self.tracker.update(operation_id, status, &reason).await {
            Ok((from, _)) => notify_in_background(
                &self.tasks,
                self.notifier.clone(),
                operation_id,
                from,
                status,
            ),
            Err(e) => {
                error!(operation_id = %operation_id, error = %e, "Failed to record import outcome")
            }
        }
    }

    async fn import(&self, mut file: File) -> ImportResult<ImportSummary> {
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await?;

        let groups = group_rows(read_rows(contents.as_slice())?)?;

        let trees: Vec<NewTodoTree> = groups
            .into_iter()
            .map(|group| NewTodoTree {
                todo: NewTodo::with_status(group.title, group.status),
                subtasks: group
                    .subtasks
                    .into_iter()
                    .map(|subtask| NewTodo::with_status(subtask.title, subtask.status))
                    .collect(),
            })
            .collect();
        let expected = trees.len();

        // Todos and subtasks commit together or not at all
        let created = self
            .todos
            .bulk_create_with_subtasks(trees, self.settings.chunk_size)
            .await?;

        if created.len() != expected {
            return Err(ImportError::Mismatch {
                expected,
                actual: created.len(),
            });
        }

        Ok(ImportSummary {
            todos: created.len(),
            subtasks: created.iter().map(|todo| todo.subtask_count as usize).sum(),
        })
    }

    /// Persist a transition, then report it inline. The webhook runs after the write committed.
    async fn transition(
        &self,
        operation_id: Uuid,
        to: OperationStatus,
        reason: &str,
    ) -> TrackerResult<()> {
        let (from, _) = self.tracker.update(operation_id, to, reason).await?;
        self.notifier.notify(operation_id, from, to).await;
        Ok(())
    }
}

/// Fail with `FileTooLarge` when a byte exists at offset `max_bytes`, otherwise
/// leave the reader rewound to the start.
pub async fn check_size<R>(reader: &mut R, max_bytes: u64) -> ImportResult<()>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    reader.seek(SeekFrom::Start(max_bytes)).await?;
    let mut extra = [0u8; 1];
    let read = reader.read(&mut extra).await?;
    if read > 0 {
        return Err(ImportError::FileTooLarge { limit: max_bytes });
    }
    reader.seek(SeekFrom::Start(0)).await?;
    Ok(())
}

fn truncate_reason(reason: &str) -> String {
    reason.chars().take(MAX_REASON_CHARS).collect()
}
