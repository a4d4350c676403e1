//! Business-function agent categories.
//!
//! Every task, deliverable, and recommendation is tagged with the coaching
//! agent responsible for that business function.

use serde::{Deserialize, Serialize};

/// Fixed enumeration of coaching agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    FinancialManagement,
    MarketingSpecialist,
    LegalAdvisor,
    OperationsSpecialist,
    CulturalConsultant,
    BusinessIntelligence,
    ExpansionSpecialist,
    ContentCreator,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinancialManagement => "financial-management",
            Self::MarketingSpecialist => "marketing-specialist",
            Self::LegalAdvisor => "legal-advisor",
            Self::OperationsSpecialist => "operations-specialist",
            Self::CulturalConsultant => "cultural-consultant",
            Self::BusinessIntelligence => "business-intelligence",
            Self::ExpansionSpecialist => "expansion-specialist",
            Self::ContentCreator => "content-creator",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "financial-management" => Some(Self::FinancialManagement),
            "marketing-specialist" => Some(Self::MarketingSpecialist),
            "legal-advisor" => Some(Self::LegalAdvisor),
            "operations-specialist" => Some(Self::OperationsSpecialist),
            "cultural-consultant" => Some(Self::CulturalConsultant),
            "business-intelligence" => Some(Self::BusinessIntelligence),
            "expansion-specialist" => Some(Self::ExpansionSpecialist),
            "content-creator" => Some(Self::ContentCreator),
            _ => None,
        }
    }

    /// Parse an agent tag coming from the completion service. Unknown tags
    /// map to the operations specialist rather than failing the batch.
    pub fn from_model_output(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Self::OperationsSpecialist)
    }

    /// All known agents, in prompt-listing order.
    pub fn all() -> &'static [AgentKind] {
        &[
            Self::FinancialManagement,
            Self::MarketingSpecialist,
            Self::LegalAdvisor,
            Self::OperationsSpecialist,
            Self::CulturalConsultant,
            Self::BusinessIntelligence,
            Self::ExpansionSpecialist,
            Self::ContentCreator,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_round_trip() {
        for agent in AgentKind::all() {
            assert_eq!(AgentKind::from_str(agent.as_str()), Some(*agent));
        }
    }

    #[test]
    fn test_unknown_model_output_falls_back() {
        assert_eq!(
            AgentKind::from_model_output("growth-hacker"),
            AgentKind::OperationsSpecialist
        );
        assert_eq!(
            AgentKind::from_model_output("Legal-Advisor"),
            AgentKind::LegalAdvisor
        );
    }
}
