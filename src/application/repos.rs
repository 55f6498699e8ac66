//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::PageRequest;
use crate::domain::tasks::{LifecycleAction, TaskRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Values for a row about to be inserted. The store assigns id and
/// bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub done: bool,
    pub due_at: Option<OffsetDateTime>,
}

/// Fields an edit may change. Lifecycle state is never part of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: String,
    pub done: bool,
    pub due_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait TasksRepo: Send + Sync {
    /// Active tasks: not done first, then by due date with undated tasks
    /// last, then newest id first.
    async fn list_active(&self, page: PageRequest) -> Result<Vec<TaskRecord>, RepoError>;

    async fn count_active(&self) -> Result<u64, RepoError>;

    /// Any existing row, active or trashed.
    async fn find_by_id(&self, id: i64) -> Result<Option<TaskRecord>, RepoError>;

    /// Trashed tasks, most recently deleted first.
    async fn list_trashed(&self) -> Result<Vec<TaskRecord>, RepoError>;
}

#[async_trait]
pub trait TasksWriteRepo: Send + Sync {
    async fn insert_task(&self, task: NewTask) -> Result<TaskRecord, RepoError>;

    /// Overwrite title, done flag and due date of an existing row.
    /// Returns `RepoError::NotFound` when the row is gone.
    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<TaskRecord, RepoError>;

    /// Flip the done flag in place. Returns `RepoError::NotFound` when the
    /// row is gone.
    async fn toggle_task(&self, id: i64) -> Result<TaskRecord, RepoError>;

    /// Apply `action` only if the row is in the state it requires, as one
    /// conditional write. Returns whether a row changed; `false` covers both
    /// a missing row and a row in the wrong state.
    async fn transition_task(&self, id: i64, action: LifecycleAction) -> Result<bool, RepoError>;
}
