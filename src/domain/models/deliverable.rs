//! Deliverable domain model.
//!
//! A deliverable is the synthesized document produced when a task completes:
//! a markdown artifact built from the user's step answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentKind;

/// A synthesized document tied to a completed task. Every synthesis run
/// produces a new row; re-synthesis never overwrites an earlier artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub agent: AgentKind,
    pub title: String,
    pub description: String,
    /// Markdown body.
    pub content: String,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

impl Deliverable {
    pub fn new(
        user_id: Uuid,
        task_id: Uuid,
        agent: AgentKind,
        title: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            task_id,
            agent,
            title: title.into(),
            description: description.into(),
            content: content.into(),
            file_type: "markdown".to_string(),
            created_at: Utc::now(),
        }
    }
}
