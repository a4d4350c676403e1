//! Step completion tracking.
//!
//! Records step inputs and propagates completion to the parent task when
//! the last step finishes.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskStatus, TaskStep};
use crate::domain::ports::{StepRepository, TaskRepository};

/// Result of completing one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCompletion {
    pub step: TaskStep,
    /// True when this completion finished the parent task.
    pub task_completed: bool,
    pub completed_steps: usize,
    pub total_steps: usize,
}

#[derive(Clone)]
pub struct StepTracker {
    tasks: Arc<dyn TaskRepository>,
    steps: Arc<dyn StepRepository>,
}

impl StepTracker {
    pub fn new(tasks: Arc<dyn TaskRepository>, steps: Arc<dyn StepRepository>) -> Self {
        Self { tasks, steps }
    }

    /// Mark a step completed with its captured input. When every step of
    /// the task is then complete, the parent task transitions to completed
    /// in the same operation. Re-completing a step only overwrites its
    /// input; an already-completed task keeps its original timestamp.
    /// Another user's task reads as not found.
    pub async fn complete_step(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        step_id: Uuid,
        input: serde_json::Value,
    ) -> DomainResult<StepCompletion> {
        let step = self
            .steps
            .get(step_id)
            .await?
            .ok_or(DomainError::StepNotFound(step_id))?;
        if step.task_id != task_id {
            return Err(DomainError::StepNotFound(step_id));
        }

        let mut task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;
        if task.user_id != user_id {
            return Err(DomainError::TaskNotFound(task_id));
        }

        self.steps.mark_completed(step_id, &input).await?;

        let all_steps = self.steps.list_for_task(task_id).await?;
        let completed_steps = all_steps.iter().filter(|s| s.is_completed()).count();
        let total_steps = all_steps.len();
        let all_done = completed_steps == total_steps;

        let mut task_completed = false;
        if all_done && task.status != TaskStatus::Completed {
            task.transition_to(TaskStatus::Completed)
                .map_err(|_| DomainError::InvalidStateTransition {
                    from: task.status.as_str().to_string(),
                    to: TaskStatus::Completed.as_str().to_string(),
                })?;
            self.tasks.update(&task).await?;
            task_completed = true;
            info!(%task_id, "Task completed via final step");
        } else if !all_done && task.status == TaskStatus::Pending {
            // First recorded input moves the task into in_progress
            task.transition_to(TaskStatus::InProgress)
                .map_err(|_| DomainError::InvalidStateTransition {
                    from: task.status.as_str().to_string(),
                    to: TaskStatus::InProgress.as_str().to_string(),
                })?;
            self.tasks.update(&task).await?;
        }

        let step = self
            .steps
            .get(step_id)
            .await?
            .ok_or(DomainError::StepNotFound(step_id))?;

        Ok(StepCompletion {
            step,
            task_completed,
            completed_steps,
            total_steps,
        })
    }
}
