//! Transactional task writing.
//!
//! Turns validated drafts into pending task rows: runs the capacity
//! governor first, then inserts the whole batch atomically with clamped
//! priorities and server-set timestamps.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Task;
use crate::domain::ports::TaskRepository;
use crate::services::capacity::CapacityGovernor;
use crate::services::gateway::TaskDraft;

#[derive(Clone)]
pub struct TaskWriter {
    tasks: Arc<dyn TaskRepository>,
    governor: CapacityGovernor,
}

impl TaskWriter {
    pub fn new(tasks: Arc<dyn TaskRepository>, governor: CapacityGovernor) -> Self {
        Self { tasks, governor }
    }

    /// Persist a batch of drafts as pending tasks. All-or-nothing: if any
    /// insert fails the whole batch rolls back. Eviction cannot touch
    /// in-progress tasks, so when it frees less room than the batch needs
    /// the batch is truncated to whatever fits under the ceiling.
    pub async fn write_batch(
        &self,
        user_id: Uuid,
        drafts: &[TaskDraft],
    ) -> DomainResult<Vec<Task>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        self.governor.make_room(user_id, drafts.len()).await?;

        let room = self.governor.remaining_room(user_id).await?;
        let accepted = &drafts[..drafts.len().min(room)];
        if accepted.len() < drafts.len() {
            warn!(
                %user_id,
                dropped = drafts.len() - accepted.len(),
                "Batch truncated at the capacity ceiling"
            );
        }
        if accepted.is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> = accepted
            .iter()
            .map(|draft| {
                let mut task = Task::new(
                    user_id,
                    draft.agent_kind(),
                    draft.title.trim(),
                    draft.description.trim(),
                );
                task.priority = draft.clamped_priority();
                task.estimated_effort = draft.estimated_effort.clone();
                task
            })
            .collect();

        for task in &tasks {
            task.validate().map_err(DomainError::ValidationFailed)?;
        }

        self.tasks.insert_batch(&tasks).await?;
        info!(%user_id, count = tasks.len(), "Wrote task batch");
        Ok(tasks)
    }
}
