//! Task lifecycle events that drive cache invalidation.

use std::fmt;

/// A committed change to the task store.
///
/// Events are fired after the store mutation succeeded; they carry only
/// what the planner needs to pick keys and tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    /// A task was inserted.
    Created { task_id: i64 },
    /// Title, done flag or due date changed.
    Edited { task_id: i64 },
    /// The done flag flipped.
    Toggled { task_id: i64 },
    /// Active task moved to the trash.
    Trashed { task_id: i64 },
    /// Trashed task became active again.
    Restored { task_id: i64 },
    /// Trashed task was removed for good.
    Purged { task_id: i64 },
}

impl TaskEvent {
    pub fn task_id(&self) -> i64 {
        match *self {
            Self::Created { task_id }
            | Self::Edited { task_id }
            | Self::Toggled { task_id }
            | Self::Trashed { task_id }
            | Self::Restored { task_id }
            | Self::Purged { task_id } => task_id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Edited { .. } => "edited",
            Self::Toggled { .. } => "toggled",
            Self::Trashed { .. } => "trashed",
            Self::Restored { .. } => "restored",
            Self::Purged { .. } => "purged",
        }
    }

    /// A new row has no cached item view yet.
    pub fn touches_item(&self) -> bool {
        !matches!(self, Self::Created { .. })
    }
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.as_str(), self.task_id())
    }
}
