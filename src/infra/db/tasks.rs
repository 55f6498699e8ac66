use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::pagination::PageRequest,
    application::repos::{NewTask, RepoError, TaskChanges, TasksRepo, TasksWriteRepo},
    domain::tasks::{LifecycleAction, TaskRecord},
};

use super::{PostgresRepositories, map_sqlx_error};

const TASK_COLUMNS: &str = "id, title, is_done, due_at, deleted_at, created_at, updated_at";

// `is_done` is nullable; NULL sorts with the open tasks.
const ACTIVE_ORDER: &str =
    " ORDER BY COALESCE(is_done, FALSE) ASC, due_at ASC NULLS LAST, id DESC";

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    is_done: Option<bool>,
    due_at: Option<OffsetDateTime>,
    deleted_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TaskRow> for TaskRecord {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            done: row.is_done.unwrap_or(false),
            due_at: row.due_at,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TasksRepo for PostgresRepositories {
    async fn list_active(&self, page: PageRequest) -> Result<Vec<TaskRecord>, RepoError> {
        let offset = i64::try_from(page.offset())
            .map_err(|_| RepoError::from_persistence("page offset exceeds supported range"))?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(TASK_COLUMNS);
        qb.push(" FROM tasks WHERE deleted_at IS NULL");
        qb.push(ACTIVE_ORDER);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<TaskRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TaskRecord::from).collect())
    }

    async fn count_active(&self) -> Result<u64, RepoError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE deleted_at IS NULL")
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TaskRecord>, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TaskRecord::from))
    }

    async fn list_trashed(&self) -> Result<Vec<TaskRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE deleted_at IS NOT NULL \
             ORDER BY deleted_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TaskRecord::from).collect())
    }
}

#[async_trait]
impl TasksWriteRepo for PostgresRepositories {
    async fn insert_task(&self, task: NewTask) -> Result<TaskRecord, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks (title, is_done, due_at) VALUES ($1, $2, $3) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.title)
        .bind(task.done)
        .bind(task.due_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<TaskRecord, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks \
             SET title = $2, is_done = $3, due_at = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(changes.done)
        .bind(changes.due_at)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(TaskRecord::from).ok_or(RepoError::NotFound)
    }

    async fn toggle_task(&self, id: i64) -> Result<TaskRecord, RepoError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks \
             SET is_done = NOT COALESCE(is_done, FALSE), updated_at = now() \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(TaskRecord::from).ok_or(RepoError::NotFound)
    }

    async fn transition_task(&self, id: i64, action: LifecycleAction) -> Result<bool, RepoError> {
        let guard = if action.requires_trashed() {
            "deleted_at IS NOT NULL"
        } else {
            "deleted_at IS NULL"
        };
        let statement = match action {
            LifecycleAction::SoftDelete => {
                "UPDATE tasks SET deleted_at = now(), updated_at = now() WHERE id = $1 AND "
            }
            LifecycleAction::Restore => {
                "UPDATE tasks SET deleted_at = NULL, updated_at = now() WHERE id = $1 AND "
            }
            LifecycleAction::Purge => "DELETE FROM tasks WHERE id = $1 AND ",
        };

        let result = sqlx::query(&format!("{statement}{guard}"))
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
