//! Evolution engine.
//!
//! Proposes the user's next focus areas. Deterministic category-progression
//! rules run first; when they yield fewer than two candidates the gateway
//! fills in model-generated suggestions. Candidates duplicating an existing
//! task title are dropped, and the final list is ranked and capped at three.

use tracing::debug;

use crate::domain::models::{
    titles_match, AgentKind, CandidateSource, MaturityScores, RecommendationCandidate, Task,
    UnifiedProfile,
};
use crate::services::gateway::CompletionGateway;
use crate::services::prompt::compile_recommendations;

/// Minimum rule-produced candidates before the model filler is skipped.
const RULE_SUFFICIENCY: usize = 2;

/// Maximum recommendations returned.
const MAX_RECOMMENDATIONS: usize = 3;

/// Average maturity above which expansion becomes a rule candidate.
const EXPANSION_MATURITY_THRESHOLD: f64 = 60.0;

fn count_completed(completed: &[Task], agent: AgentKind) -> usize {
    completed.iter().filter(|t| t.agent == agent).count()
}

fn any_task_with_agent(tasks: &[Task], agent: AgentKind) -> bool {
    tasks.iter().any(|t| t.agent == agent)
}

fn title_taken(active: &[Task], completed: &[Task], title: &str) -> bool {
    active
        .iter()
        .chain(completed.iter())
        .any(|t| titles_match(&t.title, title))
}

/// Deterministic category-progression rules. Each rule contributes at most
/// one candidate and is skipped when its title is already taken.
pub fn rule_candidates(
    completed: &[Task],
    active: &[Task],
    maturity: Option<&MaturityScores>,
) -> Vec<RecommendationCandidate> {
    let mut candidates = Vec::new();
    let mut push = |candidate: RecommendationCandidate| {
        if !title_taken(active, completed, &candidate.title) {
            candidates.push(candidate);
        }
    };

    if count_completed(completed, AgentKind::FinancialManagement) >= 2 {
        push(RecommendationCandidate::rule(
            AgentKind::BusinessIntelligence,
            "Build a financial KPI dashboard",
            "Track revenue, costs, and margin in one place, updated weekly.",
            "You have a handle on finances; now make the numbers visible at a glance.",
            1,
        ));
    }

    if count_completed(completed, AgentKind::LegalAdvisor) >= 1 {
        push(RecommendationCandidate::rule(
            AgentKind::LegalAdvisor,
            "Create your contract templates",
            "Standard client and supplier contracts you can reuse for every deal.",
            "With the legal basics done, templates save time on every agreement.",
            2,
        ));
    }

    if count_completed(completed, AgentKind::MarketingSpecialist) >= 3 {
        push(RecommendationCandidate::rule(
            AgentKind::MarketingSpecialist,
            "Automate your marketing",
            "Set up scheduled posts and an email sequence for new contacts.",
            "Your marketing is working; automation keeps it running without daily effort.",
            1,
        ));
    }

    if completed.len() >= 5 {
        push(RecommendationCandidate::rule(
            AgentKind::CulturalConsultant,
            "Design your first team structure",
            "Define the first role to hire or delegate and what success looks like for it.",
            "You are completing enough work that the next bottleneck is you.",
            2,
        ));
    }

    let maturity_ready = maturity
        .map(|m| m.average() > EXPANSION_MATURITY_THRESHOLD)
        .unwrap_or(false);
    if maturity_ready
        && !any_task_with_agent(active, AgentKind::ExpansionSpecialist)
        && !any_task_with_agent(completed, AgentKind::ExpansionSpecialist)
    {
        push(RecommendationCandidate::rule(
            AgentKind::ExpansionSpecialist,
            "Explore your next market",
            "Identify one adjacent market or channel and size the opportunity.",
            "Your maturity scores say the core business is ready to grow beyond it.",
            2,
        ));
    }

    candidates
}

#[derive(Clone)]
pub struct EvolutionEngine {
    gateway: CompletionGateway,
}

impl EvolutionEngine {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self { gateway }
    }

    /// Produce the ranked recommendation list. Nothing is persisted here;
    /// promotion to tasks goes through the task writer.
    pub async fn recommend(
        &self,
        profile: &UnifiedProfile,
        completed: &[Task],
        active: &[Task],
    ) -> Vec<RecommendationCandidate> {
        let mut candidates = rule_candidates(completed, active, profile.maturity.as_ref());
        debug!(rule_count = candidates.len(), "Rule candidates");

        if candidates.len() < RULE_SUFFICIENCY {
            let prompt = compile_recommendations(profile);
            let drafts = self
                .gateway
                .generate_recommendations(&prompt)
                .await
                .into_inner();

            for draft in drafts {
                let taken = title_taken(active, completed, &draft.title)
                    || candidates.iter().any(|c| titles_match(&c.title, &draft.title));
                if taken {
                    continue;
                }
                candidates.push(RecommendationCandidate::model(
                    draft.agent_kind(),
                    draft.title.clone(),
                    draft.description.clone(),
                    draft.rationale.clone().unwrap_or_default(),
                    draft.priority.unwrap_or(3),
                ));
            }
        }

        candidates.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then_with(|| {
                // Rules outrank model fillers at equal priority
                match (a.source, b.source) {
                    (CandidateSource::Rule, CandidateSource::Model) => std::cmp::Ordering::Less,
                    (CandidateSource::Model, CandidateSource::Rule) => std::cmp::Ordering::Greater,
                    _ => std::cmp::Ordering::Equal,
                }
            })
        });
        candidates.truncate(MAX_RECOMMENDATIONS);
        candidates
    }
}
