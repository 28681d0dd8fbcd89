use async_trait::async_trait;
use todo_core::task::{CreateTask, Task, UpdateTask};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("connection failed: {0}")]
    Transport(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// The four operations on the task resource.
///
/// The TUI programs against this trait; `HttpTaskClient` is the production
/// implementation. Calls are single attempts: nothing here retries.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// All tasks of the authenticated user, in server order.
    async fn list(&self) -> Result<Vec<Task>, ServiceError>;
    async fn create(&self, input: &CreateTask) -> Result<Task, ServiceError>;
    async fn update(&self, id: &str, update: &UpdateTask) -> Result<Task, ServiceError>;
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
}
