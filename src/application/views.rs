//! JSON representations of tasks, shared by the HTTP surface and the caches.

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::application::pagination::ListPage;
use crate::domain::error::DomainError;
use crate::domain::tasks::TaskRecord;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Cached under `task:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: i64,
    pub title: String,
    pub is_done: bool,
    pub due_at: Option<String>,
}

/// Cached under `tasks:list:p<page>:l<limit>`.
pub type TaskListPage = ListPage<TaskView>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashedTaskView {
    #[serde(flatten)]
    pub task: TaskView,
    pub deleted_at: Option<String>,
}

impl From<&TaskRecord> for TaskView {
    fn from(record: &TaskRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            is_done: record.done,
            due_at: record.due_at.and_then(format_timestamp),
        }
    }
}

impl From<&TaskRecord> for TrashedTaskView {
    fn from(record: &TaskRecord) -> Self {
        Self {
            task: TaskView::from(record),
            deleted_at: record.deleted_at.and_then(format_timestamp),
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_timestamp(at: OffsetDateTime) -> Option<String> {
    at.to_offset(UtcOffset::UTC).format(TIMESTAMP_FORMAT).ok()
}

/// Accepts `YYYY-MM-DD HH:MM:SS` (read as UTC) or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, DomainError> {
    let raw = raw.trim();
    PrimitiveDateTime::parse(raw, TIMESTAMP_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .or_else(|_| OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339))
        .map_err(|_| DomainError::InvalidDueAt {
            value: raw.to_string(),
        })
}
