use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::TaskStep;

/// Repository port for task step persistence.
#[async_trait]
pub trait StepRepository: Send + Sync {
    /// Insert a full set of steps for a task atomically.
    async fn insert_batch(&self, steps: &[TaskStep]) -> DomainResult<()>;

    /// List a task's steps ordered by step number.
    async fn list_for_task(&self, task_id: Uuid) -> DomainResult<Vec<TaskStep>>;

    /// Get a step by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<TaskStep>>;

    /// Mark a step completed and store the captured user input. Completing
    /// an already-completed step overwrites its stored input.
    async fn mark_completed(&self, id: Uuid, user_input: &serde_json::Value)
        -> DomainResult<()>;
}
