// ABOUTME: Todo and subtask storage layer using SQLite
// ABOUTME: Handles CRUD, filtered pagination, and chunked bulk inserts

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tasklane_core::{chunked, new_id, utcnow, LimitOffset, BULK_SIZE_LIMIT};
use tasklane_storage::{StorageError, StorageResult};
use tracing::debug;
use uuid::Uuid;

use crate::store::{SubTaskStore, TodoStore};
use crate::types::{NewSubTask, NewTodo, NewTodoTree, SubTask, TaskChanges, Todo, TodoQuery};

const TODO_COLUMNS: &str = "t.todo_id, t.title, t.status, t.created_at, t.updated_at, \
     (SELECT COUNT(*) FROM subtasks s WHERE s.todo_id = t.todo_id) AS subtask_count";

// Freshly inserted todos have no subtasks yet
const TODO_RETURNING: &str =
    " RETURNING todo_id, title, status, created_at, updated_at, 0 AS subtask_count";

const SUBTASK_COLUMNS: &str = "subtask_id, todo_id, title, status, created_at, updated_at";

pub struct TodoStorage {
    pool: SqlitePool,
}

impl TodoStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_todo(row: &SqliteRow) -> StorageResult<Todo> {
        Ok(Todo {
            todo_id: row.try_get("todo_id")?,
            title: row.try_get("title")?,
            status: row.try_get("status")?,
            subtask_count: row.try_get("subtask_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            subtasks: None,
        })
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &TodoQuery) {
        if let Some(min) = query.min_subtasks {
            builder.push(" WHERE (SELECT COUNT(*) FROM subtasks s WHERE s.todo_id = t.todo_id) >= ");
            builder.push_bind(i64::from(min));
        }
    }

    async fn attach_subtasks(&self, todos: &mut [Todo]) -> StorageResult<()> {
        let ids: Vec<Uuid> = todos.iter().map(|todo| todo.todo_id).collect();
        let mut by_todo: HashMap<Uuid, Vec<SubTask>> = HashMap::new();

        for chunk in chunked(&ids, BULK_SIZE_LIMIT) {
            let mut builder = QueryBuilder::<Sqlite>::new(format!(
                "SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE todo_id IN ("
            ));
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(") ORDER BY created_at ASC, rowid ASC");

            let rows = builder
                .build()
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

            for row in &rows {
                let subtask = row_to_subtask(row)?;
                by_todo.entry(subtask.todo_id).or_default().push(subtask);
            }
        }

        for todo in todos.iter_mut() {
            todo.subtasks = Some(by_todo.remove(&todo.todo_id).unwrap_or_default());
        }
        Ok(())
    }
}

#[async_trait]
impl TodoStore for TodoStorage {
    async fn get_by_id(&self, todo_id: Uuid) -> StorageResult<Option<Todo>> {
        debug!("Fetching todo: {}", todo_id);

        let row = sqlx::query(&format!("SELECT {TODO_COLUMNS} FROM todos t WHERE t.todo_id = ?"))
            .bind(todo_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(Self::row_to_todo).transpose()
    }

    async fn exists(&self, todo_id: Uuid) -> StorageResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM todos WHERE todo_id = ?")
            .bind(todo_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(found.is_some())
    }

    async fn list(&self, query: TodoQuery, page: LimitOffset) -> StorageResult<(Vec<Todo>, u64)> {
        debug!(
            "Listing todos (limit: {}, offset: {}, min_subtasks: {:?}, include_subtasks: {})",
            page.limit, page.offset, query.min_subtasks, query.include_subtasks
        );

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM todos t");
        Self::push_filters(&mut count_query, &query);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut list_query = QueryBuilder::<Sqlite>::new(format!("SELECT {TODO_COLUMNS} FROM todos t"));
        Self::push_filters(&mut list_query, &query);
        list_query.push(" ORDER BY t.created_at DESC, t.rowid DESC LIMIT ");
        list_query.push_bind(page.sql_limit());
        list_query.push(" OFFSET ");
        list_query.push_bind(page.sql_offset());

        let rows = list_query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut todos = rows
            .iter()
            .map(Self::row_to_todo)
            .collect::<StorageResult<Vec<_>>>()?;

        if query.include_subtasks {
            self.attach_subtasks(&mut todos).await?;
        }

        Ok((todos, count.max(0) as u64))
    }

    async fn create(&self, input: NewTodo) -> StorageResult<Todo> {
        let todo_id = new_id();
        let now = utcnow();

        debug!("Creating todo: {}", todo_id);

        let row = sqlx::query(&format!(
            "INSERT INTO todos (todo_id, title, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?){TODO_RETURNING}"
        ))
        .bind(todo_id)
        .bind(&input.title)
        .bind(input.status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Self::row_to_todo(&row)
    }

    async fn update(&self, todo_id: Uuid, changes: TaskChanges) -> StorageResult<Option<Todo>> {
        debug!("Updating todo: {}", todo_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result =
            sqlx::query("UPDATE todos SET title = ?, status = ?, updated_at = ? WHERE todo_id = ?")
                .bind(&changes.title)
                .bind(changes.status)
                .bind(utcnow())
                .bind(todo_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(&format!("SELECT {TODO_COLUMNS} FROM todos t WHERE t.todo_id = ?"))
            .bind(todo_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;
        let todo = Self::row_to_todo(&row)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(Some(todo))
    }

    async fn delete(&self, todo_id: Uuid) -> StorageResult<bool> {
        debug!("Deleting todo: {}", todo_id);

        let result = sqlx::query("DELETE FROM todos WHERE todo_id = ?")
            .bind(todo_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn bulk_create(&self, items: Vec<NewTodo>, chunk_size: usize) -> StorageResult<Vec<Todo>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Bulk creating {} todos (chunk size: {})", items.len(), chunk_size);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        let todos = insert_todos(&mut tx, &items, chunk_size, utcnow()).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(todos)
    }

    async fn bulk_create_with_subtasks(
        &self,
        items: Vec<NewTodoTree>,
        chunk_size: usize,
    ) -> StorageResult<Vec<Todo>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let (new_todos, children): (Vec<NewTodo>, Vec<Vec<NewTodo>>) = items
            .into_iter()
            .map(|tree| (tree.todo, tree.subtasks))
            .unzip();
        debug!(
            "Bulk creating {} todos with {} subtasks (chunk size: {})",
            new_todos.len(),
            children.iter().map(Vec::len).sum::<usize>(),
            chunk_size
        );

        let now = utcnow();
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let mut todos = insert_todos(&mut tx, &new_todos, chunk_size, now).await?;

        // Nth todo owns the Nth list of children
        let new_subtasks: Vec<NewSubTask> = todos
            .iter()
            .zip(&children)
            .flat_map(|(todo, subtasks)| {
                let todo_id = todo.todo_id;
                subtasks.iter().map(move |subtask| NewSubTask {
                    todo_id,
                    title: subtask.title.clone(),
                    status: subtask.status,
                })
            })
            .collect();
        let mut subtasks = insert_subtasks(&mut tx, &new_subtasks, chunk_size, now)
            .await?
            .into_iter();

        tx.commit().await.map_err(StorageError::Sqlx)?;

        for (todo, expected) in todos.iter_mut().zip(&children) {
            let attached: Vec<SubTask> = subtasks.by_ref().take(expected.len()).collect();
            todo.subtask_count = attached.len() as i64;
            todo.subtasks = Some(attached);
        }

        Ok(todos)
    }
}

/// Chunked multi-row insert on an open transaction. The result is in input order.
async fn insert_todos(
    conn: &mut SqliteConnection,
    items: &[NewTodo],
    chunk_size: usize,
    now: DateTime<Utc>,
) -> StorageResult<Vec<Todo>> {
    let ids: Vec<Uuid> = items.iter().map(|_| new_id()).collect();
    let mut created: HashMap<Uuid, Todo> = HashMap::with_capacity(items.len());

    for (chunk_ids, chunk) in chunked(&ids, chunk_size).zip(chunked(items, chunk_size)) {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "INSERT INTO todos (todo_id, title, status, created_at, updated_at) ",
        );
        builder.push_values(chunk_ids.iter().zip(chunk), |mut row, (id, item)| {
            row.push_bind(*id)
                .push_bind(item.title.clone())
                .push_bind(item.status)
                .push_bind(now)
                .push_bind(now);
        });
        builder.push(TODO_RETURNING);

        let rows = builder
            .build()
            .fetch_all(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        for row in &rows {
            let todo = TodoStorage::row_to_todo(row)?;
            created.insert(todo.todo_id, todo);
        }
    }

    // RETURNING order is unspecified, so rebuild input order from the generated ids
    ids.iter()
        .map(|id| {
            created.remove(id).ok_or_else(|| {
                StorageError::InvalidData(format!("bulk insert did not return todo {id}"))
            })
        })
        .collect()
}

async fn insert_subtasks(
    conn: &mut SqliteConnection,
    items: &[NewSubTask],
    chunk_size: usize,
    now: DateTime<Utc>,
) -> StorageResult<Vec<SubTask>> {
    let ids: Vec<Uuid> = items.iter().map(|_| new_id()).collect();
    let mut created: HashMap<Uuid, SubTask> = HashMap::with_capacity(items.len());

    for (chunk_ids, chunk) in chunked(&ids, chunk_size).zip(chunked(items, chunk_size)) {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "INSERT INTO subtasks (subtask_id, todo_id, title, status, created_at, updated_at) ",
        );
        builder.push_values(chunk_ids.iter().zip(chunk), |mut row, (id, item)| {
            row.push_bind(*id)
                .push_bind(item.todo_id)
                .push_bind(item.title.clone())
                .push_bind(item.status)
                .push_bind(now)
                .push_bind(now);
        });
        builder.push(format!(" RETURNING {SUBTASK_COLUMNS}"));

        let rows = builder
            .build()
            .fetch_all(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        for row in &rows {
            let subtask = row_to_subtask(row)?;
            created.insert(subtask.subtask_id, subtask);
        }
    }

    ids.iter()
        .map(|id| {
            created.remove(id).ok_or_else(|| {
                StorageError::InvalidData(format!("bulk insert did not return subtask {id}"))
            })
        })
        .collect()
}

/// `NotFound` unless the todo exists as seen by this transaction
async fn require_parent(conn: &mut SqliteConnection, todo_id: Uuid) -> StorageResult<()> {
    let parent: Option<i64> = sqlx::query_scalar("SELECT 1 FROM todos WHERE todo_id = ?")
        .bind(todo_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    match parent {
        Some(_) => Ok(()),
        None => Err(StorageError::not_found("Todo", todo_id)),
    }
}

pub struct SubTaskStorage {
    pool: SqlitePool,
}

impl SubTaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_subtask(row: &SqliteRow) -> StorageResult<SubTask> {
    Ok(SubTask {
        subtask_id: row.try_get("subtask_id")?,
        todo_id: row.try_get("todo_id")?,
        title: row.try_get("title")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl SubTaskStore for SubTaskStorage {
    async fn get_by_id(&self, todo_id: Uuid, subtask_id: Uuid) -> StorageResult<Option<SubTask>> {
        debug!("Fetching subtask: {} (todo: {})", subtask_id, todo_id);

        let row = sqlx::query(&format!(
            "SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE todo_id = ? AND subtask_id = ?"
        ))
        .bind(todo_id)
        .bind(subtask_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_subtask).transpose()
    }

    async fn list_by_todo(&self, todo_id: Uuid) -> StorageResult<Vec<SubTask>> {
        debug!("Listing subtasks for todo: {}", todo_id);

        let rows = sqlx::query(&format!(
            "SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE todo_id = ? ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(todo_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_subtask).collect()
    }

    async fn create(&self, input: NewSubTask) -> StorageResult<SubTask> {
        let subtask_id = new_id();
        let now = utcnow();

        debug!("Creating subtask: {} for todo: {}", subtask_id, input.todo_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        require_parent(&mut tx, input.todo_id).await?;

        let row = sqlx::query(&format!(
            "INSERT INTO subtasks (subtask_id, todo_id, title, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {SUBTASK_COLUMNS}"
        ))
        .bind(subtask_id)
        .bind(input.todo_id)
        .bind(&input.title)
        .bind(input.status)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;
        let subtask = row_to_subtask(&row)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(subtask)
    }

    async fn update(
        &self,
        todo_id: Uuid,
        subtask_id: Uuid,
        changes: TaskChanges,
    ) -> StorageResult<Option<SubTask>> {
        debug!("Updating subtask: {} (todo: {})", subtask_id, todo_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        require_parent(&mut tx, todo_id).await?;

        let row = sqlx::query(&format!(
            "UPDATE subtasks SET title = ?, status = ?, updated_at = ? \
             WHERE todo_id = ? AND subtask_id = ? RETURNING {SUBTASK_COLUMNS}"
        ))
        .bind(&changes.title)
        .bind(changes.status)
        .bind(utcnow())
        .bind(todo_id)
        .bind(subtask_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;
        let subtask = row.as_ref().map(row_to_subtask).transpose()?;

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(subtask)
    }

    async fn delete(&self, todo_id: Uuid, subtask_id: Uuid) -> StorageResult<bool> {
        debug!("Deleting subtask: {} (todo: {})", subtask_id, todo_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        require_parent(&mut tx, todo_id).await?;

        let result = sqlx::query("DELETE FROM subtasks WHERE todo_id = ? AND subtask_id = ?")
            .bind(todo_id)
            .bind(subtask_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn bulk_create(
        &self,
        items: Vec<NewSubTask>,
        chunk_size: usize,
    ) -> StorageResult<Vec<SubTask>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Bulk creating {} subtasks (chunk size: {})", items.len(), chunk_size);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        let subtasks = insert_subtasks(&mut tx, &items, chunk_size, utcnow()).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(subtasks)
    }
}
