use serde::Deserialize;
use time::OffsetDateTime;

use crate::application::views::parse_timestamp;
use crate::domain::error::DomainError;

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Body for creating or editing a task.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWriteRequest {
    pub title: String,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub due_at: Option<String>,
}

impl TaskWriteRequest {
    /// Blank strings clear the due date.
    pub fn parsed_due_at(&self) -> Result<Option<OffsetDateTime>, DomainError> {
        match self.due_at.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_timestamp(raw).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn camel_case_body_is_accepted() {
        let request: TaskWriteRequest = serde_json::from_str(
            r#"{"title":"Buy milk","isDone":true,"dueAt":"2024-05-01 09:30:00"}"#,
        )
        .unwrap();

        assert!(request.is_done);
        assert_eq!(
            request.parsed_due_at().unwrap(),
            Some(datetime!(2024-05-01 09:30:00 UTC))
        );
    }

    #[test]
    fn optional_fields_default() {
        let request: TaskWriteRequest = serde_json::from_str(r#"{"title":"x","dueAt":" "}"#).unwrap();
        assert!(!request.is_done);
        assert_eq!(request.parsed_due_at().unwrap(), None);
    }
}
