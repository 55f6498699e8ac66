//! Task handlers

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::AppError;
use crate::application::pagination::PageRequest;
use crate::application::tasks::{CreateTaskCommand, TaskError, Transition, UpdateTaskCommand};

use super::error::{ApiError, task_to_api};
use super::extract::TaskId;
use super::models::{TaskListQuery, TaskWriteRequest};
use super::state::AppState;

/// Response header reporting whether a lifecycle transition was applied.
pub const TRANSITION_HEADER: &str = "x-task-transition";

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::from_query(query.page.as_deref(), query.limit.as_deref());
    let listing = state.tasks.list_active(page).await.map_err(task_to_api)?;
    Ok(Json(listing))
}

pub async fn list_trash(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let trashed = state.tasks.list_trashed().await.map_err(task_to_api)?;
    Ok(Json(trashed))
}

pub async fn show_task(
    State(state): State<AppState>,
    TaskId(id): TaskId,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.tasks.show(id).await.map_err(task_to_api)?;
    Ok(Json(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<TaskWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let due_at = payload
        .parsed_due_at()
        .map_err(|err| task_to_api(TaskError::Validation(err)))?;

    let command = CreateTaskCommand {
        title: payload.title,
        done: payload.is_done,
        due_at,
    };

    let task = state.tasks.create(command).await.map_err(task_to_api)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn edit_task(
    State(state): State<AppState>,
    TaskId(id): TaskId,
    Json(payload): Json<TaskWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let due_at = payload
        .parsed_due_at()
        .map_err(|err| task_to_api(TaskError::Validation(err)))?;

    let command = UpdateTaskCommand {
        id,
        title: payload.title,
        done: payload.is_done,
        due_at,
    };

    let task = state.tasks.edit(command).await.map_err(task_to_api)?;
    Ok(Json(task))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    TaskId(id): TaskId,
) -> Result<impl IntoResponse, ApiError> {
    let task = state.tasks.toggle(id).await.map_err(task_to_api)?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    TaskId(id): TaskId,
) -> Result<Response, ApiError> {
    let outcome = state.tasks.soft_delete(id).await.map_err(task_to_api)?;
    Ok(transition_response(outcome))
}

pub async fn restore_task(
    State(state): State<AppState>,
    TaskId(id): TaskId,
) -> Result<Response, ApiError> {
    let outcome = state.tasks.restore(id).await.map_err(task_to_api)?;
    Ok(transition_response(outcome))
}

pub async fn purge_task(
    State(state): State<AppState>,
    TaskId(id): TaskId,
) -> Result<Response, ApiError> {
    let outcome = state.tasks.purge(id).await.map_err(task_to_api)?;
    Ok(transition_response(outcome))
}

pub async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.health.check().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Skipped transitions answer like applied ones; the header tells them apart.
fn transition_response(outcome: Transition) -> Response {
    let label = if outcome.is_applied() {
        "applied"
    } else {
        "skipped"
    };
    (StatusCode::NO_CONTENT, [(TRANSITION_HEADER, label)]).into_response()
}
