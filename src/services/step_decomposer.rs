//! Step decomposition.
//!
//! Breaks a task into ordered, input-capturing steps. Idempotent: if steps
//! already exist for the task they are returned unchanged.

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Task, TaskStep, UnifiedProfile};
use crate::domain::ports::{StepRepository, TaskRepository};
use crate::services::gateway::CompletionGateway;
use crate::services::prompt::compile_step_decomposition;

/// Whether a decomposition call found existing steps or created new ones.
#[derive(Debug, Clone, PartialEq)]
pub enum DecomposeOutcome {
    Existing(Vec<TaskStep>),
    Created(Vec<TaskStep>),
}

impl DecomposeOutcome {
    pub fn steps(&self) -> &[TaskStep] {
        match self {
            Self::Existing(steps) | Self::Created(steps) => steps,
        }
    }

    pub fn into_steps(self) -> Vec<TaskStep> {
        match self {
            Self::Existing(steps) | Self::Created(steps) => steps,
        }
    }
}

#[derive(Clone)]
pub struct StepDecomposer {
    tasks: Arc<dyn TaskRepository>,
    steps: Arc<dyn StepRepository>,
    gateway: CompletionGateway,
}

impl StepDecomposer {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        steps: Arc<dyn StepRepository>,
        gateway: CompletionGateway,
    ) -> Self {
        Self {
            tasks,
            steps,
            gateway,
        }
    }

    /// Decompose a task into steps, generating them on first call. The
    /// gateway's fallback plan guarantees at least one step even when the
    /// upstream is down. Another user's task reads as not found.
    pub async fn decompose(
        &self,
        task_id: Uuid,
        profile: &UnifiedProfile,
    ) -> DomainResult<DecomposeOutcome> {
        let task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;
        if task.user_id != profile.user_id {
            return Err(DomainError::TaskNotFound(task_id));
        }

        let existing = self.steps.list_for_task(task_id).await?;
        if !existing.is_empty() {
            debug!(%task_id, count = existing.len(), "Steps already exist");
            return Ok(DecomposeOutcome::Existing(existing));
        }

        let steps = self.generate_steps(&task, profile).await;
        self.steps.insert_batch(&steps).await?;
        info!(%task_id, count = steps.len(), "Created steps");
        Ok(DecomposeOutcome::Created(steps))
    }

    async fn generate_steps(&self, task: &Task, profile: &UnifiedProfile) -> Vec<TaskStep> {
        let prompt = compile_step_decomposition(profile, &task.title, &task.description);
        let drafts = self
            .gateway
            .generate_steps(&prompt, &task.title)
            .await
            .into_inner();

        drafts
            .iter()
            .enumerate()
            .map(|(i, draft)| {
                // Step numbers come from array position, not model output
                let mut step = TaskStep::new(
                    task.id,
                    (i as u32) + 1,
                    draft.title.trim(),
                    draft.description.trim(),
                )
                .with_input_kind(draft.input_kind());
                step.validation_criteria = draft.validation_criteria.clone();
                step.guidance = draft.guidance.clone();
                step
            })
            .collect()
    }
}
