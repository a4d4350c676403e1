//! Task domain model.
//!
//! Tasks are units of recommended work assigned to a user, scoped to one
//! business-function agent, and completed by working through ordered steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentKind;

/// Highest priority value (most urgent).
pub const PRIORITY_HIGHEST: u8 = 1;
/// Lowest priority value (least urgent).
pub const PRIORITY_LOWEST: u8 = 5;

/// Status of a task in the coaching workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is assigned but the user has not engaged with it yet
    #[default]
    Pending,
    /// User has started working on the task's steps
    InProgress,
    /// All steps completed
    Completed,
    /// Evicted by the capacity governor or removed by the user
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" | "complete" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Active tasks count against the capacity ceiling.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        match self {
            Self::Pending => matches!(new_status, Self::InProgress | Self::Completed | Self::Cancelled),
            Self::InProgress => matches!(new_status, Self::Completed | Self::Cancelled),
            Self::Completed | Self::Cancelled => false,
        }
    }
}

/// Clamp a priority value from the completion service into the valid range.
/// Missing values default to the lowest-urgency end of the range.
pub fn clamp_priority(raw: Option<i64>) -> u8 {
    match raw {
        Some(p) if p < i64::from(PRIORITY_HIGHEST) => PRIORITY_HIGHEST,
        Some(p) if p > i64::from(PRIORITY_LOWEST) => PRIORITY_LOWEST,
        Some(p) => p as u8,
        None => 3,
    }
}

/// A unit of recommended work assigned to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub agent: AgentKind,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// 1 = highest urgency, 5 = lowest. Always within range in persisted rows.
    pub priority: u8,
    pub estimated_effort: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        user_id: Uuid,
        agent: AgentKind,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            agent,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::default(),
            priority: 3,
            estimated_effort: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Set priority, clamping into the valid range.
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = clamp_priority(Some(priority));
        self
    }

    pub fn with_estimated_effort(mut self, effort: impl Into<String>) -> Self {
        self.estimated_effort = Some(effort.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Transition to a new status, stamping timestamps.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), String> {
        if !self.status.can_transition_to(new_status) {
            return Err(format!(
                "Cannot transition from {} to {}",
                self.status.as_str(),
                new_status.as_str()
            ));
        }

        self.status = new_status;
        self.updated_at = Utc::now();
        if new_status == TaskStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("Task description cannot be empty".to_string());
        }
        if self.priority < PRIORITY_HIGHEST || self.priority > PRIORITY_LOWEST {
            return Err(format!("Task priority {} out of range", self.priority));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_priority() {
        assert_eq!(clamp_priority(Some(0)), 1);
        assert_eq!(clamp_priority(Some(-7)), 1);
        assert_eq!(clamp_priority(Some(1)), 1);
        assert_eq!(clamp_priority(Some(5)), 5);
        assert_eq!(clamp_priority(Some(42)), 5);
        assert_eq!(clamp_priority(None), 3);
    }

    #[test]
    fn test_status_transitions() {
        let mut task = Task::new(
            Uuid::new_v4(),
            AgentKind::FinancialManagement,
            "Define pricing",
            "Work out per-unit pricing",
        );

        assert!(task.transition_to(TaskStatus::InProgress).is_ok());
        assert!(task.transition_to(TaskStatus::Completed).is_ok());
        assert!(task.completed_at.is_some());

        // Terminal states reject further transitions
        assert!(task.transition_to(TaskStatus::Pending).is_err());
        assert!(task.transition_to(TaskStatus::Cancelled).is_err());
    }

    #[test]
    fn test_completed_at_not_rewritten() {
        let mut task = Task::new(
            Uuid::new_v4(),
            AgentKind::LegalAdvisor,
            "Register the brand",
            "File the trademark paperwork",
        );
        task.transition_to(TaskStatus::Completed).unwrap();
        let first = task.completed_at.unwrap();

        // A second completion attempt is rejected and the stamp is preserved
        assert!(task.transition_to(TaskStatus::Completed).is_err());
        assert_eq!(task.completed_at, Some(first));
    }

    #[test]
    fn test_active_statuses() {
        assert!(TaskStatus::Pending.is_active());
        assert!(TaskStatus::InProgress.is_active());
        assert!(!TaskStatus::Completed.is_active());
        assert!(!TaskStatus::Cancelled.is_active());
    }

    #[test]
    fn test_validate_priority_range() {
        let mut task = Task::new(
            Uuid::new_v4(),
            AgentKind::MarketingSpecialist,
            "Title",
            "Description",
        );
        task.priority = 9;
        assert!(task.validate().is_err());
        task.priority = 2;
        assert!(task.validate().is_ok());
    }
}
