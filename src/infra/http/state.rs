use std::sync::Arc;

use async_trait::async_trait;

use crate::application::tasks::TaskService;
use crate::infra::db::PostgresRepositories;
use crate::infra::error::InfraError;

/// Liveness probe for the record store behind `GET /health`.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn check(&self) -> Result<(), InfraError>;
}

#[async_trait]
impl StoreHealth for PostgresRepositories {
    async fn check(&self) -> Result<(), InfraError> {
        self.health_check()
            .await
            .map_err(InfraError::store)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<TaskService>,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    pub fn new(tasks: TaskService, health: Arc<dyn StoreHealth>) -> Self {
        Self {
            tasks: Arc::new(tasks),
            health,
        }
    }
}
