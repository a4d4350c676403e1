use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Deliverable;

/// Repository port for synthesized deliverables.
#[async_trait]
pub trait DeliverableRepository: Send + Sync {
    /// Insert a deliverable. Always a new row; synthesis never overwrites.
    async fn insert(&self, deliverable: &Deliverable) -> DomainResult<()>;

    /// List a user's deliverables, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Deliverable>>;

    /// List deliverables produced for one task, newest first.
    async fn list_for_task(&self, task_id: Uuid) -> DomainResult<Vec<Deliverable>>;
}
