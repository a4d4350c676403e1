//! Evolution recommendation candidates.
//!
//! The evolution engine proposes next-focus areas from deterministic rules
//! over the user's task history and maturity, topped up by model-generated
//! suggestions. Candidates are ephemeral; promotion to real tasks goes
//! through the task writer.

use serde::{Deserialize, Serialize};

use super::agent::AgentKind;
use super::task::clamp_priority;

/// Where a recommendation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Rule,
    Model,
}

/// A proposed next focus area for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationCandidate {
    pub agent: AgentKind,
    pub title: String,
    pub description: String,
    pub rationale: String,
    /// 1 = highest urgency, 5 = lowest. Always clamped.
    pub priority: u8,
    pub estimated_effort: Option<String>,
    pub source: CandidateSource,
}

impl RecommendationCandidate {
    pub fn rule(
        agent: AgentKind,
        title: impl Into<String>,
        description: impl Into<String>,
        rationale: impl Into<String>,
        priority: u8,
    ) -> Self {
        Self {
            agent,
            title: title.into(),
            description: description.into(),
            rationale: rationale.into(),
            priority: clamp_priority(Some(i64::from(priority))),
            estimated_effort: None,
            source: CandidateSource::Rule,
        }
    }

    pub fn model(
        agent: AgentKind,
        title: impl Into<String>,
        description: impl Into<String>,
        rationale: impl Into<String>,
        priority: i64,
    ) -> Self {
        Self {
            agent,
            title: title.into(),
            description: description.into(),
            rationale: rationale.into(),
            priority: clamp_priority(Some(priority)),
            estimated_effort: None,
            source: CandidateSource::Model,
        }
    }

    pub fn with_estimated_effort(mut self, effort: impl Into<String>) -> Self {
        self.estimated_effort = Some(effort.into());
        self
    }
}

/// Case-insensitive title comparison used for dedup against existing tasks
/// and across candidate sources.
pub fn titles_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_match() {
        assert!(titles_match("Define Your Pricing", "define your pricing"));
        assert!(titles_match("  Launch a website ", "Launch a website"));
        assert!(!titles_match("Launch a website", "Launch a storefront"));
    }

    #[test]
    fn test_model_candidate_priority_clamped() {
        let c = RecommendationCandidate::model(
            AgentKind::MarketingSpecialist,
            "Run a campaign",
            "desc",
            "because",
            99,
        );
        assert_eq!(c.priority, 5);
    }
}
