//! Business profile and maturity scoring models.
//!
//! The unified profile is the fused context every prompt is compiled from:
//! the stored business profile, the latest maturity assessment, and a
//! summary of the user's task history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's stored business profile. Every descriptive field is optional;
/// absent fields render as "unspecified" in compiled prompts rather than
/// blocking generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub user_id: Uuid,
    pub brand_name: Option<String>,
    pub business_description: Option<String>,
    pub business_type: Option<String>,
    pub target_market: Option<String>,
    pub current_stage: Option<String>,
    pub location: Option<String>,
    pub team_size: Option<String>,
    pub time_availability: Option<String>,
    pub monthly_revenue_goal: Option<f64>,
    pub years_in_business: Option<i64>,
    pub initial_investment: Option<String>,
    pub primary_skills: Vec<String>,
    pub current_challenges: Vec<String>,
    pub business_goals: Vec<String>,
    pub sales_channels: Vec<String>,
    pub social_media_presence: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessProfile {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }
}

/// A maturity assessment snapshot across the four scored dimensions.
/// Scores are 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaturityScores {
    pub idea_validation: u8,
    pub user_experience: u8,
    pub market_fit: u8,
    pub monetization: u8,
}

impl MaturityScores {
    pub fn new(idea_validation: u8, user_experience: u8, market_fit: u8, monetization: u8) -> Self {
        Self {
            idea_validation,
            user_experience,
            market_fit,
            monetization,
        }
    }

    /// Mean of the four dimensions, used for coarse stage classification.
    pub fn average(&self) -> f64 {
        f64::from(
            u32::from(self.idea_validation)
                + u32::from(self.user_experience)
                + u32::from(self.market_fit)
                + u32::from(self.monetization),
        ) / 4.0
    }

    /// The dimension with the lowest score, as a prompt-facing label.
    pub fn weakest_dimension(&self) -> &'static str {
        let dims = [
            (self.idea_validation, "idea validation"),
            (self.user_experience, "user experience"),
            (self.market_fit, "market fit"),
            (self.monetization, "monetization"),
        ];
        dims.iter()
            .min_by_key(|(score, _)| *score)
            .map(|(_, name)| *name)
            .unwrap_or("idea validation")
    }
}

/// Compact view of the user's existing workload, fused into prompts so the
/// model avoids recommending duplicate work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskHistory {
    /// Titles of pending and in-progress tasks.
    pub active_titles: Vec<String>,
    /// Titles of completed tasks.
    pub completed_titles: Vec<String>,
}

impl TaskHistory {
    pub fn active_count(&self) -> usize {
        self.active_titles.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed_titles.len()
    }
}

/// The fused context object all prompt compilation reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedProfile {
    pub user_id: Uuid,
    pub profile: Option<BusinessProfile>,
    pub maturity: Option<MaturityScores>,
    pub history: TaskHistory,
}

impl UnifiedProfile {
    /// A profile with neither stored fields nor maturity scores carries no
    /// signal; generation against it would be generic noise.
    pub fn has_sufficient_context(&self) -> bool {
        self.profile.is_some() || self.maturity.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average() {
        let scores = MaturityScores::new(20, 40, 60, 80);
        assert!((scores.average() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weakest_dimension() {
        let scores = MaturityScores::new(70, 30, 55, 45);
        assert_eq!(scores.weakest_dimension(), "user experience");
    }

    #[test]
    fn test_sufficient_context() {
        let user_id = Uuid::new_v4();
        let empty = UnifiedProfile {
            user_id,
            profile: None,
            maturity: None,
            history: TaskHistory::default(),
        };
        assert!(!empty.has_sufficient_context());

        let scored = UnifiedProfile {
            user_id,
            profile: None,
            maturity: Some(MaturityScores::new(10, 10, 10, 10)),
            history: TaskHistory::default(),
        };
        assert!(scored.has_sufficient_context());
    }
}
