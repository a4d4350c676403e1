//! Deliverable synthesis.
//!
//! Builds the finished working document for a task from the founder's own
//! inputs. Synthesis carries no fallback: a degraded upstream surfaces
//! `DomainError::SynthesisFailed`, leaves the task untouched, and writes
//! no row. Every successful run inserts a fresh deliverable.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Deliverable, UnifiedProfile};
use crate::domain::ports::{DeliverableRepository, StepRepository, TaskRepository};
use crate::services::gateway::CompletionGateway;
use crate::services::prompt::{compile_deliverable_from_answers, compile_deliverable_from_steps};

/// Where the synthesis inputs come from.
#[derive(Debug, Clone)]
pub enum SynthesisSource {
    /// The task's persisted steps and their captured inputs.
    Steps,
    /// Flat question/answer pairs from a conversational flow.
    Answers(Vec<(String, String)>),
}

#[derive(Clone)]
pub struct DeliverableSynthesizer {
    tasks: Arc<dyn TaskRepository>,
    steps: Arc<dyn StepRepository>,
    deliverables: Arc<dyn DeliverableRepository>,
    gateway: CompletionGateway,
}

impl DeliverableSynthesizer {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        steps: Arc<dyn StepRepository>,
        deliverables: Arc<dyn DeliverableRepository>,
        gateway: CompletionGateway,
    ) -> Self {
        Self {
            tasks,
            steps,
            deliverables,
            gateway,
        }
    }

    /// Another user's task reads as not found.
    pub async fn synthesize(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        profile: &UnifiedProfile,
        source: SynthesisSource,
    ) -> DomainResult<Deliverable> {
        let task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;
        if task.user_id != user_id {
            return Err(DomainError::TaskNotFound(task_id));
        }

        let prompt = match &source {
            SynthesisSource::Steps => {
                let steps = self.steps.list_for_task(task_id).await?;
                if steps.is_empty() {
                    return Err(DomainError::SynthesisFailed(format!(
                        "Task {task_id} has no steps to synthesize from"
                    )));
                }
                compile_deliverable_from_steps(profile, &task.title, &steps)
            }
            SynthesisSource::Answers(pairs) => {
                if pairs.is_empty() {
                    return Err(DomainError::SynthesisFailed(
                        "No answers provided for synthesis".to_string(),
                    ));
                }
                compile_deliverable_from_answers(profile, &task.title, pairs)
            }
        };

        let content = self.gateway.generate_document(&prompt).await.map_err(|e| {
            warn!(%task_id, error = %e, "Synthesis failed");
            DomainError::SynthesisFailed(e.to_string())
        })?;

        let deliverable = Deliverable::new(
            user_id,
            task_id,
            task.agent,
            &task.title,
            format!("Working document for: {}", task.title),
            content,
        );
        self.deliverables.insert(&deliverable).await?;
        info!(%task_id, deliverable_id = %deliverable.id, "Synthesized deliverable");
        Ok(deliverable)
    }
}
