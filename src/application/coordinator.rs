//! Coordinator: the single dispatch entry point.
//!
//! The UI layer calls `dispatch(action, payload)` with a string-tagged
//! action and a JSON payload; responses are action-specific JSON. The
//! coordinator wires the services together and owns the pipeline ordering
//! for multi-stage actions.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{RecommendationCandidate, TaskHistory};
use crate::domain::ports::TaskRepository;
use crate::services::gateway::{CompletionGateway, TaskDraft};
use crate::services::prompt::{compile_questions, compile_task_generation};
use crate::services::{
    DecomposeOutcome, DeliverableSynthesizer, EvolutionEngine, ProfileFusionService,
    StepDecomposer, StepTracker, SynthesisSource, TaskWriter,
};

/// Every action the coordinator can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorAction {
    EvolveTasks,
    GetCoachingMessage,
    AnalyzeProgress,
    AnalyzeAndGenerateTasks,
    GenerateIntelligentQuestions,
    CreateTaskSteps,
    CompleteStep,
    GenerateDeliverable,
    GenerateIntelligentRecommendations,
}

impl CoordinatorAction {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        serde_json::from_value(Value::String(s.to_string())).ok()
    }
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct TaskPayload {
    user_id: Uuid,
    task_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct StepPayload {
    user_id: Uuid,
    task_id: Uuid,
    step_id: Uuid,
    #[serde(default)]
    input: Value,
}

#[derive(Debug, Deserialize)]
struct DeliverablePayload {
    user_id: Uuid,
    task_id: Uuid,
    /// Optional conversational Q&A pairs; absent means synthesize from steps.
    #[serde(default)]
    answers: Option<Vec<AnswerPair>>,
}

#[derive(Debug, Deserialize)]
struct AnswerPair {
    question: String,
    answer: String,
}

#[derive(Clone)]
pub struct Coordinator {
    fusion: ProfileFusionService,
    gateway: CompletionGateway,
    writer: TaskWriter,
    decomposer: StepDecomposer,
    tracker: StepTracker,
    synthesizer: DeliverableSynthesizer,
    evolution: EvolutionEngine,
    tasks: Arc<dyn TaskRepository>,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fusion: ProfileFusionService,
        gateway: CompletionGateway,
        writer: TaskWriter,
        decomposer: StepDecomposer,
        tracker: StepTracker,
        synthesizer: DeliverableSynthesizer,
        evolution: EvolutionEngine,
        tasks: Arc<dyn TaskRepository>,
    ) -> Self {
        Self {
            fusion,
            gateway,
            writer,
            decomposer,
            tracker,
            synthesizer,
            evolution,
            tasks,
        }
    }

    /// Dispatch one action. Payloads always carry `user_id`; task and step
    /// actions additionally carry `task_id`/`step_id`.
    pub async fn dispatch(&self, action: CoordinatorAction, payload: Value) -> DomainResult<Value> {
        info!(?action, "Dispatching");
        match action {
            CoordinatorAction::AnalyzeAndGenerateTasks => {
                let p: UserPayload = parse_payload(payload)?;
                self.analyze_and_generate_tasks(p.user_id).await
            }
            CoordinatorAction::CreateTaskSteps => {
                let p: TaskPayload = parse_payload(payload)?;
                self.create_task_steps(p.user_id, p.task_id).await
            }
            CoordinatorAction::CompleteStep => {
                let p: StepPayload = parse_payload(payload)?;
                self.complete_step(p.user_id, p.task_id, p.step_id, p.input)
                    .await
            }
            CoordinatorAction::GenerateDeliverable => {
                let p: DeliverablePayload = parse_payload(payload)?;
                self.generate_deliverable(p).await
            }
            CoordinatorAction::GenerateIntelligentQuestions => {
                let p: TaskPayload = parse_payload(payload)?;
                self.generate_questions(p.user_id, p.task_id).await
            }
            CoordinatorAction::GenerateIntelligentRecommendations => {
                let p: UserPayload = parse_payload(payload)?;
                let recs = self.recommendations(p.user_id).await?;
                Ok(json!({ "recommendations": recs }))
            }
            CoordinatorAction::EvolveTasks => {
                let p: UserPayload = parse_payload(payload)?;
                self.evolve_tasks(p.user_id).await
            }
            CoordinatorAction::GetCoachingMessage => {
                let p: UserPayload = parse_payload(payload)?;
                let history = self.fusion.task_history(p.user_id).await?;
                Ok(json!({ "message": coaching_message(&history) }))
            }
            CoordinatorAction::AnalyzeProgress => {
                let p: UserPayload = parse_payload(payload)?;
                let history = self.fusion.task_history(p.user_id).await?;
                Ok(progress_analysis(&history))
            }
        }
    }

    /// Fuse profile → compile prompt → generate → govern capacity → insert.
    async fn analyze_and_generate_tasks(&self, user_id: Uuid) -> DomainResult<Value> {
        let profile = self.fusion.fuse(user_id).await?;
        let prompt = compile_task_generation(&profile);

        let generated = self.gateway.generate_tasks(&prompt).await;
        let degraded = generated.is_fallback();
        let tasks = self.writer.write_batch(user_id, &generated.into_inner()).await?;

        Ok(json!({ "tasks": tasks, "degraded": degraded }))
    }

    async fn create_task_steps(&self, user_id: Uuid, task_id: Uuid) -> DomainResult<Value> {
        let profile = self.fusion.fuse(user_id).await?;
        let outcome = self.decomposer.decompose(task_id, &profile).await?;

        let existing = matches!(outcome, DecomposeOutcome::Existing(_));
        Ok(json!({ "steps": outcome.into_steps(), "existing": existing }))
    }

    async fn complete_step(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        step_id: Uuid,
        input: Value,
    ) -> DomainResult<Value> {
        let completion = self
            .tracker
            .complete_step(user_id, task_id, step_id, input)
            .await?;
        Ok(json!({
            "step": completion.step,
            "task_completed": completion.task_completed,
            "completed_steps": completion.completed_steps,
            "total_steps": completion.total_steps,
        }))
    }

    async fn generate_deliverable(&self, p: DeliverablePayload) -> DomainResult<Value> {
        let profile = self.fusion.fuse(p.user_id).await?;
        let source = match p.answers {
            Some(pairs) => SynthesisSource::Answers(
                pairs.into_iter().map(|a| (a.question, a.answer)).collect(),
            ),
            None => SynthesisSource::Steps,
        };

        let deliverable = self
            .synthesizer
            .synthesize(p.user_id, p.task_id, &profile, source)
            .await?;
        Ok(json!({ "deliverable": deliverable }))
    }

    async fn generate_questions(&self, user_id: Uuid, task_id: Uuid) -> DomainResult<Value> {
        let profile = self.fusion.fuse(user_id).await?;
        let task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(DomainError::TaskNotFound(task_id))?;
        if task.user_id != user_id {
            return Err(DomainError::TaskNotFound(task_id));
        }

        let prompt = compile_questions(&profile, &task.title);
        let questions = self.gateway.generate_questions(&prompt).await.into_inner();
        Ok(json!({ "questions": questions }))
    }

    async fn recommendations(&self, user_id: Uuid) -> DomainResult<Vec<RecommendationCandidate>> {
        let profile = self.fusion.fuse(user_id).await?;
        let completed = self.tasks.list_completed(user_id).await?;
        let active = self.tasks.list_active(user_id).await?;
        Ok(self.evolution.recommend(&profile, &completed, &active).await)
    }

    /// Recommend, then promote the candidates to pending tasks.
    async fn evolve_tasks(&self, user_id: Uuid) -> DomainResult<Value> {
        let candidates = self.recommendations(user_id).await?;
        if candidates.is_empty() {
            return Ok(json!({ "tasks": [] }));
        }

        let drafts: Vec<TaskDraft> = candidates.iter().map(candidate_to_draft).collect();
        let tasks = self.writer.write_batch(user_id, &drafts).await?;
        Ok(json!({ "tasks": tasks }))
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(payload: Value) -> DomainResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| DomainError::ValidationFailed(format!("Invalid payload: {e}")))
}

fn candidate_to_draft(candidate: &RecommendationCandidate) -> TaskDraft {
    TaskDraft {
        title: candidate.title.clone(),
        description: candidate.description.clone(),
        agent: Some(candidate.agent.as_str().to_string()),
        priority: Some(i64::from(candidate.priority)),
        estimated_effort: candidate.estimated_effort.clone(),
    }
}

/// Deterministic coaching message from task counts. No model call.
pub fn coaching_message(history: &TaskHistory) -> String {
    let completed = history.completed_count();
    let active = history.active_count();

    let mut message = if completed == 0 {
        "Welcome! Your first tasks are ready. Start with the highest-priority one \
         and work through its steps one at a time."
            .to_string()
    } else if completed < 3 {
        format!(
            "Good start: {completed} task{} done. Momentum comes from finishing, \
             not starting; pick your next task and see it through.",
            if completed == 1 { "" } else { "s" }
        )
    } else if completed < 10 {
        format!(
            "Strong progress: {completed} tasks completed. Your business foundation \
             is taking shape; keep the rhythm going."
        )
    } else {
        format!(
            "Impressive: {completed} tasks completed. You are operating like a \
             seasoned founder; time to think about what to delegate."
        )
    };

    if active > 12 {
        message.push_str(
            " You have a lot on your plate right now; consider pausing new tasks \
             and closing out what is open.",
        );
    } else if active < 5 {
        message.push_str(" You have room for more. Generate new tasks when you are ready.");
    }

    message
}

/// Deterministic progress snapshot from task counts.
pub fn progress_analysis(history: &TaskHistory) -> Value {
    let completed = history.completed_count();
    let active = history.active_count();
    let total = completed + active;
    let completion_rate = if total == 0 {
        0.0
    } else {
        (completed as f64 / total as f64 * 100.0).round()
    };

    let suggestion = if completed >= 3 {
        "Your execution is consistent. Shift focus toward scaling: systems, \
         delegation, and repeatable marketing."
    } else {
        "Focus on completing the fundamentals before adding new work. Finished \
         tasks compound; half-done ones do not."
    };

    json!({
        "total_tasks": total,
        "active_tasks": active,
        "completed_tasks": completed,
        "completion_rate": completion_rate,
        "recent_completions": history.completed_titles.iter().take(5).collect::<Vec<_>>(),
        "suggestion": suggestion,
    })
}

/// Convenience wire-up from a pool and a completion client.
pub fn build_coordinator(
    pool: sqlx::SqlitePool,
    client: Arc<dyn crate::domain::ports::CompletionClient>,
    retry: crate::services::RetryPolicy,
    call_timeout: std::time::Duration,
    max_tokens: usize,
) -> Coordinator {
    use crate::adapters::sqlite::{
        SqliteDeliverableRepository, SqliteProfileRepository, SqliteStepRepository,
        SqliteTaskRepository,
    };
    use crate::services::CapacityGovernor;

    let profiles = Arc::new(SqliteProfileRepository::new(pool.clone()));
    let tasks: Arc<SqliteTaskRepository> = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let steps = Arc::new(SqliteStepRepository::new(pool.clone()));
    let deliverables = Arc::new(SqliteDeliverableRepository::new(pool));

    let gateway = CompletionGateway::new(client, retry, call_timeout, max_tokens);
    let governor = CapacityGovernor::new(tasks.clone());

    Coordinator::new(
        ProfileFusionService::new(profiles, tasks.clone()),
        gateway.clone(),
        TaskWriter::new(tasks.clone(), governor),
        StepDecomposer::new(tasks.clone(), steps.clone(), gateway.clone()),
        StepTracker::new(tasks.clone(), steps.clone()),
        DeliverableSynthesizer::new(tasks.clone(), steps, deliverables, gateway.clone()),
        EvolutionEngine::new(gateway),
        tasks,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(completed: usize, active: usize) -> TaskHistory {
        TaskHistory {
            active_titles: (0..active).map(|i| format!("A{i}")).collect(),
            completed_titles: (0..completed).map(|i| format!("C{i}")).collect(),
        }
    }

    #[test]
    fn test_coaching_tiers() {
        assert!(coaching_message(&history(0, 5)).contains("Welcome"));
        assert!(coaching_message(&history(2, 5)).contains("Good start"));
        assert!(coaching_message(&history(7, 5)).contains("Strong progress"));
        assert!(coaching_message(&history(12, 5)).contains("Impressive"));
    }

    #[test]
    fn test_coaching_workload_hints() {
        assert!(coaching_message(&history(5, 13)).contains("pausing"));
        assert!(coaching_message(&history(5, 2)).contains("room for more"));
        let mid = coaching_message(&history(5, 8));
        assert!(!mid.contains("pausing") && !mid.contains("room for more"));
    }

    #[test]
    fn test_progress_analysis_rates() {
        let report = progress_analysis(&history(3, 1));
        assert_eq!(report["total_tasks"], 4);
        assert_eq!(report["completion_rate"], 75.0);
        assert!(report["suggestion"].as_str().unwrap().contains("scaling"));

        let empty = progress_analysis(&history(0, 0));
        assert_eq!(empty["completion_rate"], 0.0);
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!(
            CoordinatorAction::from_str("analyze_and_generate_tasks"),
            Some(CoordinatorAction::AnalyzeAndGenerateTasks)
        );
        assert_eq!(
            CoordinatorAction::from_str("complete_step"),
            Some(CoordinatorAction::CompleteStep)
        );
        assert_eq!(CoordinatorAction::from_str("reboot_universe"), None);
    }
}
