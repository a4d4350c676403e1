//! Task step domain model.
//!
//! Steps are the ordered sub-units of a task. Each one captures a specific
//! user input; a task completes when its last step does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Expected input for a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepInputKind {
    #[default]
    Text,
    Number,
    Url,
    Email,
    Select,
    File,
}

impl StepInputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Url => "url",
            Self::Email => "email",
            Self::Select => "select",
            Self::File => "file",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "url" => Some(Self::Url),
            "email" => Some(Self::Email),
            "select" => Some(Self::Select),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    /// Parse an input kind from the completion service; unknown kinds
    /// degrade to free text.
    pub fn from_model_output(s: &str) -> Self {
        Self::from_str(s).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Completed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" | "complete" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// An ordered sub-unit of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStep {
    pub id: Uuid,
    pub task_id: Uuid,
    /// 1-based, contiguous within a task.
    pub step_number: u32,
    pub title: String,
    pub description: String,
    pub input_kind: StepInputKind,
    /// Free-form structured validation hint from generation.
    pub validation_criteria: Option<serde_json::Value>,
    /// Contextual guidance prompt for in-step assistance.
    pub guidance: Option<String>,
    pub status: StepStatus,
    /// Captured user input. Overwritten on re-completion.
    pub user_input: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskStep {
    pub fn new(
        task_id: Uuid,
        step_number: u32,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_id,
            step_number,
            title: title.into(),
            description: description.into(),
            input_kind: StepInputKind::default(),
            validation_criteria: None,
            guidance: None,
            status: StepStatus::default(),
            user_input: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_input_kind(mut self, kind: StepInputKind) -> Self {
        self.input_kind = kind;
        self
    }

    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = Some(guidance.into());
        self
    }

    pub fn with_validation_criteria(mut self, criteria: serde_json::Value) -> Self {
        self.validation_criteria = Some(criteria);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

/// Check the contiguity invariant: step numbers are 1..=n with no gaps.
/// Input must already be ordered by step_number.
pub fn steps_are_contiguous(steps: &[TaskStep]) -> bool {
    steps
        .iter()
        .enumerate()
        .all(|(i, step)| step.step_number == (i as u32) + 1)
}
