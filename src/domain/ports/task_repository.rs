use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Task;

/// Repository port for task persistence operations.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a single task.
    async fn insert(&self, task: &Task) -> DomainResult<()>;

    /// Insert a batch of tasks atomically. Either every task lands or none do.
    async fn insert_batch(&self, tasks: &[Task]) -> DomainResult<()>;

    /// Get a task by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Task>>;

    /// List a user's active tasks (pending and in-progress), oldest first.
    async fn list_active(&self, user_id: Uuid) -> DomainResult<Vec<Task>>;

    /// List a user's completed tasks, most recently completed first.
    async fn list_completed(&self, user_id: Uuid) -> DomainResult<Vec<Task>>;

    /// Count a user's active tasks.
    async fn count_active(&self, user_id: Uuid) -> DomainResult<i64>;

    /// Persist status and timestamp changes to an existing task.
    async fn update(&self, task: &Task) -> DomainResult<()>;

    /// Mark the given tasks cancelled in one statement.
    async fn cancel_many(&self, ids: &[Uuid]) -> DomainResult<()>;
}
