//! Profile fusion.
//!
//! Read-only merge of the stored business profile, the latest maturity
//! snapshot, and the user's task history into the `UnifiedProfile` that
//! every prompt is compiled from.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{TaskHistory, UnifiedProfile};
use crate::domain::ports::{ProfileRepository, TaskRepository};

#[derive(Clone)]
pub struct ProfileFusionService {
    profiles: Arc<dyn ProfileRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl ProfileFusionService {
    pub fn new(profiles: Arc<dyn ProfileRepository>, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { profiles, tasks }
    }

    /// Fuse everything known about a user. Fails with
    /// `DomainError::InsufficientContext` when neither a profile nor any
    /// maturity snapshot exists; generation never runs on an empty context.
    pub async fn fuse(&self, user_id: Uuid) -> DomainResult<UnifiedProfile> {
        let profile = self.profiles.get_profile(user_id).await?;
        let maturity = self.profiles.latest_maturity(user_id).await?;

        if profile.is_none() && maturity.is_none() {
            return Err(DomainError::InsufficientContext(user_id));
        }

        let history = self.task_history(user_id).await?;
        debug!(
            %user_id,
            has_profile = profile.is_some(),
            has_maturity = maturity.is_some(),
            active = history.active_count(),
            completed = history.completed_count(),
            "Fused profile"
        );

        Ok(UnifiedProfile {
            user_id,
            profile,
            maturity,
            history,
        })
    }

    /// Task history only, without the sufficiency check. Used by the
    /// coaching-message and progress paths that run fine on empty profiles.
    pub async fn task_history(&self, user_id: Uuid) -> DomainResult<TaskHistory> {
        let active = self.tasks.list_active(user_id).await?;
        let completed = self.tasks.list_completed(user_id).await?;

        Ok(TaskHistory {
            active_titles: active.into_iter().map(|t| t.title).collect(),
            completed_titles: completed.into_iter().map(|t| t.title).collect(),
        })
    }
}
