//! JSON HTTP surface over the task service.

mod error;
mod extract;
mod handlers;
mod middleware;
mod models;
mod state;

pub use error::{ApiError, ApiErrorBody, ApiErrorMessage, codes};
pub use extract::TaskId;
pub use handlers::TRANSITION_HEADER;
pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use state::{AppState, StoreHealth};

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/tasks/trash", get(handlers::list_trash))
        .route(
            "/tasks/{id}",
            get(handlers::show_task).post(handlers::delete_task),
        )
        .route("/tasks/{id}/edit", post(handlers::edit_task))
        .route("/tasks/{id}/toggle", post(handlers::toggle_task))
        .route("/tasks/{id}/restore", post(handlers::restore_task))
        .route("/tasks/{id}/purge", post(handlers::purge_task))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
