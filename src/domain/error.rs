use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("task title must not be empty")]
    EmptyTitle,
    #[error("task title exceeds {max} characters")]
    TitleTooLong { max: usize },
    #[error("due date `{value}` is not a valid timestamp")]
    InvalidDueAt { value: String },
}
