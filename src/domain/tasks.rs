//! Task records and the soft-delete lifecycle.
//!
//! A task is either [`LifecycleState::Active`] or [`LifecycleState::Trashed`]
//! while its row exists. Purging removes the row, so the third state has no
//! in-memory representation.

use serde::Serialize;
use time::OffsetDateTime;

use super::error::DomainError;

/// Maximum title length, mirroring the `VARCHAR(255)` column.
pub const TITLE_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    pub done: bool,
    pub due_at: Option<OffsetDateTime>,
    pub deleted_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    Trashed { deleted_at: OffsetDateTime },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    SoftDelete,
    Restore,
    Purge,
}

impl LifecycleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleAction::SoftDelete => "soft_delete",
            LifecycleAction::Restore => "restore",
            LifecycleAction::Purge => "purge",
        }
    }

    /// State the row must be in for the action to apply. Stores evaluate
    /// this inside the write itself, never on an earlier read.
    pub fn requires_trashed(self) -> bool {
        !matches!(self, LifecycleAction::SoftDelete)
    }
}

impl LifecycleState {
    /// Whether `action` is a legal transition out of this state.
    ///
    /// Soft-delete only leaves Active; restore and purge only leave Trashed.
    pub fn permits(self, action: LifecycleAction) -> bool {
        self.is_trashed() == action.requires_trashed()
    }

    pub fn is_trashed(self) -> bool {
        matches!(self, LifecycleState::Trashed { .. })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Active => "active",
            LifecycleState::Trashed { .. } => "trashed",
        }
    }
}

impl TaskRecord {
    pub fn state(&self) -> LifecycleState {
        match self.deleted_at {
            None => LifecycleState::Active,
            Some(deleted_at) => LifecycleState::Trashed { deleted_at },
        }
    }
}

/// Trim and validate a user-supplied title.
pub fn normalize_title(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::EmptyTitle);
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::TitleTooLong {
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(trimmed.to_string())
}
