//! Task lifecycle service.
//!
//! Every mutation writes the store first and fires the cache trigger only
//! after the write returned. Reads go through the item cache (`show`) or the
//! tagged list cache (`list_active`); the trash listing is never cached.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::application::pagination::{ListPage, PageRequest};
use crate::application::repos::{NewTask, RepoError, TaskChanges, TasksRepo, TasksWriteRepo};
use crate::application::views::{TaskListPage, TaskView, TrashedTaskView};
use crate::cache::{CacheError, CacheTrigger, ItemCache, TaggedCache, TaskCacheKey, TaskEvent};
use crate::domain::error::DomainError;
use crate::domain::tasks::{LifecycleAction, TaskRecord, normalize_title};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task `{id}` not found")]
    NotFound { id: i64 },
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Outcome of a guarded lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The store was mutated and caches were invalidated.
    Applied,
    /// The task was not in a state that permits the action; nothing changed.
    Skipped,
}

impl Transition {
    pub fn is_applied(self) -> bool {
        matches!(self, Transition::Applied)
    }
}

#[derive(Debug, Clone)]
pub struct CreateTaskCommand {
    pub title: String,
    pub done: bool,
    pub due_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct UpdateTaskCommand {
    pub id: i64,
    pub title: String,
    pub done: bool,
    pub due_at: Option<OffsetDateTime>,
}

#[derive(Clone)]
pub struct TaskService {
    reader: Arc<dyn TasksRepo>,
    writer: Arc<dyn TasksWriteRepo>,
    items: ItemCache,
    lists: TaggedCache,
    trigger: CacheTrigger,
}

impl TaskService {
    pub fn new(
        reader: Arc<dyn TasksRepo>,
        writer: Arc<dyn TasksWriteRepo>,
        items: ItemCache,
        lists: TaggedCache,
    ) -> Self {
        let trigger = CacheTrigger::new(items.clone(), lists.clone());
        Self {
            reader,
            writer,
            items,
            lists,
            trigger,
        }
    }

    /// One page of active tasks, served from `tasks:list:p<page>:l<limit>`.
    #[instrument(skip_all, fields(page = page.page, limit = page.limit))]
    pub async fn list_active(&self, page: PageRequest) -> Result<TaskListPage, TaskError> {
        let key = TaskCacheKey::list_page(page.page, page.limit);
        let reader = self.reader.clone();

        self.lists
            .get(
                &key.to_string(),
                self.lists.default_ttl(),
                key.tags(),
                || async move {
                    let records = reader.list_active(page).await?;
                    let total = reader.count_active().await?;
                    let items = records.iter().map(TaskView::from).collect();
                    Ok::<_, TaskError>(ListPage::new(items, page, total))
                },
            )
            .await
    }

    /// A single task, active or trashed, served from `task:<id>`.
    ///
    /// A missing task is reported as [`TaskError::NotFound`] and never cached.
    #[instrument(skip(self))]
    pub async fn show(&self, id: i64) -> Result<TaskView, TaskError> {
        let key = TaskCacheKey::item(id).to_string();
        let reader = self.reader.clone();

        self.items
            .remember(&key, self.items.default_ttl(), || async move {
                reader
                    .find_by_id(id)
                    .await?
                    .map(|record| TaskView::from(&record))
                    .ok_or(TaskError::NotFound { id })
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_trashed(&self) -> Result<Vec<TrashedTaskView>, TaskError> {
        let records = self.reader.list_trashed().await?;
        Ok(records.iter().map(TrashedTaskView::from).collect())
    }

    #[instrument(skip(self, command))]
    pub async fn create(&self, command: CreateTaskCommand) -> Result<TaskView, TaskError> {
        let CreateTaskCommand {
            title,
            done,
            due_at,
        } = command;
        let title = normalize_title(&title)?;

        let record = self
            .writer
            .insert_task(NewTask {
                title,
                done,
                due_at,
            })
            .await?;
        self.trigger
            .fire(TaskEvent::Created { task_id: record.id })
            .await;

        Ok(TaskView::from(&record))
    }

    #[instrument(skip(self, command), fields(id = command.id))]
    pub async fn edit(&self, command: UpdateTaskCommand) -> Result<TaskView, TaskError> {
        let UpdateTaskCommand {
            id,
            title,
            done,
            due_at,
        } = command;
        let changes = TaskChanges {
            title: normalize_title(&title)?,
            done,
            due_at,
        };

        let record = self
            .writer
            .update_task(id, &changes)
            .await
            .map_err(|err| not_found_or_repo(err, id))?;
        self.trigger.fire(TaskEvent::Edited { task_id: id }).await;

        Ok(TaskView::from(&record))
    }

    #[instrument(skip(self))]
    pub async fn toggle(&self, id: i64) -> Result<TaskView, TaskError> {
        let record = self
            .writer
            .toggle_task(id)
            .await
            .map_err(|err| not_found_or_repo(err, id))?;
        self.trigger.fire(TaskEvent::Toggled { task_id: id }).await;

        Ok(TaskView::from(&record))
    }

    /// Active → Trashed. Skipped for a task already in the trash.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: i64) -> Result<Transition, TaskError> {
        self.transition(id, LifecycleAction::SoftDelete, TaskEvent::Trashed { task_id: id })
            .await
    }

    /// Trashed → Active. Skipped for an active task.
    #[instrument(skip(self))]
    pub async fn restore(&self, id: i64) -> Result<Transition, TaskError> {
        self.transition(id, LifecycleAction::Restore, TaskEvent::Restored { task_id: id })
            .await
    }

    /// Trashed → removed. Skipped for an active task; purging is only
    /// reachable through the trash.
    #[instrument(skip(self))]
    pub async fn purge(&self, id: i64) -> Result<Transition, TaskError> {
        self.transition(id, LifecycleAction::Purge, TaskEvent::Purged { task_id: id })
            .await
    }

    /// Insert `count` placeholder tasks titled `Dummy Task <n>`. Listings are
    /// invalidated once for the whole batch.
    #[instrument(skip(self))]
    pub async fn seed(&self, count: u32) -> Result<Vec<TaskView>, TaskError> {
        let mut created = Vec::with_capacity(count as usize);
        let mut events = Vec::with_capacity(count as usize);

        for n in 1..=count {
            let record = self
                .writer
                .insert_task(NewTask {
                    title: format!("Dummy Task {n}"),
                    done: false,
                    due_at: None,
                })
                .await?;
            events.push(TaskEvent::Created { task_id: record.id });
            created.push(TaskView::from(&record));
        }

        self.trigger.fire_all(events).await;
        Ok(created)
    }

    /// The store decides applicability in the write itself. A write that
    /// changed nothing is told apart from a missing row by a follow-up read.
    async fn transition(
        &self,
        id: i64,
        action: LifecycleAction,
        event: TaskEvent,
    ) -> Result<Transition, TaskError> {
        if self.writer.transition_task(id, action).await? {
            self.trigger.fire(event).await;
            return Ok(Transition::Applied);
        }

        let record = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(TaskError::NotFound { id })?;
        Ok(skipped(&record, action))
    }
}

fn not_found_or_repo(err: RepoError, id: i64) -> TaskError {
    match err {
        RepoError::NotFound => TaskError::NotFound { id },
        other => TaskError::Repo(other),
    }
}

/// A row that permits `action` by the time it is re-read changed state
/// between the conditional write and the read.
fn skipped(record: &TaskRecord, action: LifecycleAction) -> Transition {
    let state = record.state();
    debug!(
        id = record.id,
        state = state.as_str(),
        action = action.as_str(),
        concurrent = state.permits(action),
        "Lifecycle transition not permitted; leaving task unchanged"
    );
    Transition::Skipped
}
