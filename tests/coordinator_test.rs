//! End-to-end coordinator tests against an in-memory database and a
//! scripted completion client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use maestro::adapters::sqlite::{
    all_embedded_migrations, create_test_pool, Migrator, SqliteDeliverableRepository,
    SqliteProfileRepository, SqliteTaskRepository,
};
use maestro::domain::ports::{
    CompletionClient, CompletionError, CompletionRequest, DeliverableRepository,
    ProfileRepository, TaskRepository,
};
use maestro::services::RetryPolicy;
use maestro::{
    build_coordinator, AgentKind, BusinessProfile, Coordinator, CoordinatorAction, DomainError,
    MaturityScores, Task, TaskStatus,
};

/// Replays a queue of scripted replies; repeats the last one when drained.
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, u16>>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<String, u16>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        let mut queue = self.replies.lock().unwrap();
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(CompletionError::from_status(status, "scripted".to_string())),
            None => Err(CompletionError::NetworkError("no script".to_string())),
        }
    }
}

struct Harness {
    coordinator: Coordinator,
    profiles: SqliteProfileRepository,
    tasks: SqliteTaskRepository,
    deliverables: SqliteDeliverableRepository,
}

async fn harness(replies: Vec<Result<String, u16>>) -> Harness {
    let pool = create_test_pool().await.unwrap();
    Migrator::new(pool.clone())
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .unwrap();

    let coordinator = build_coordinator(
        pool.clone(),
        Arc::new(ScriptedClient::new(replies)),
        RetryPolicy::new(1, 1, 2),
        Duration::from_secs(5),
        2048,
    );

    Harness {
        coordinator,
        profiles: SqliteProfileRepository::new(pool.clone()),
        tasks: SqliteTaskRepository::new(pool.clone()),
        deliverables: SqliteDeliverableRepository::new(pool),
    }
}

async fn seed_profile(h: &Harness, user_id: Uuid) {
    let mut profile = BusinessProfile::new(user_id);
    profile.brand_name = Some("Dulces Rosita".to_string());
    profile.business_type = Some("food".to_string());
    h.profiles.upsert_profile(&profile).await.unwrap();
    h.profiles
        .insert_maturity(user_id, &MaturityScores::new(40, 35, 30, 20))
        .await
        .unwrap();
}

fn tasks_reply() -> String {
    json!([
        {"title": "Calculate your unit costs", "description": "Cost out each product", "agent": "financial-management", "priority": 1, "estimated_effort": "2 hours"},
        {"title": "Post three times this week", "description": "Consistent content", "agent": "content-creator", "priority": 3}
    ])
    .to_string()
}

fn steps_reply() -> String {
    json!([
        {"title": "List your ingredients", "description": "Everything that goes into one batch", "input_type": "text"},
        {"title": "Total the cost", "description": "Add up the batch cost", "input_type": "number"}
    ])
    .to_string()
}

#[tokio::test]
async fn test_generation_requires_context() {
    let h = harness(vec![Ok(tasks_reply())]).await;
    let user_id = Uuid::new_v4();

    let err = h
        .coordinator
        .dispatch(
            CoordinatorAction::AnalyzeAndGenerateTasks,
            json!({ "user_id": user_id }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InsufficientContext(_)));
}

#[tokio::test]
async fn test_full_task_lifecycle() {
    let h = harness(vec![
        Ok(tasks_reply()),
        Ok(steps_reply()),
        Ok("# Unit Cost Worksheet\nFlour: ...".to_string()),
    ])
    .await;
    let user_id = Uuid::new_v4();
    seed_profile(&h, user_id).await;

    // Generate tasks
    let response = h
        .coordinator
        .dispatch(
            CoordinatorAction::AnalyzeAndGenerateTasks,
            json!({ "user_id": user_id }),
        )
        .await
        .unwrap();
    assert_eq!(response["degraded"], false);
    let task_id = response["tasks"][0]["id"].as_str().unwrap().to_string();

    // Decompose into steps
    let response = h
        .coordinator
        .dispatch(
            CoordinatorAction::CreateTaskSteps,
            json!({ "user_id": user_id, "task_id": task_id }),
        )
        .await
        .unwrap();
    assert_eq!(response["existing"], false);
    let steps = response["steps"].as_array().unwrap().clone();
    assert_eq!(steps.len(), 2);

    // Complete both steps; the second completes the task
    for (i, step) in steps.iter().enumerate() {
        let response = h
            .coordinator
            .dispatch(
                CoordinatorAction::CompleteStep,
                json!({
                    "user_id": user_id,
                    "task_id": task_id,
                    "step_id": step["id"],
                    "input": format!("answer {i}"),
                }),
            )
            .await
            .unwrap();
        assert_eq!(response["task_completed"], i == steps.len() - 1);
    }

    let task = h
        .tasks
        .get(Uuid::parse_str(&task_id).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    // Synthesize the deliverable from the captured steps
    let response = h
        .coordinator
        .dispatch(
            CoordinatorAction::GenerateDeliverable,
            json!({ "user_id": user_id, "task_id": task_id }),
        )
        .await
        .unwrap();
    assert!(response["deliverable"]["content"]
        .as_str()
        .unwrap()
        .starts_with("# Unit Cost Worksheet"));
    assert_eq!(h.deliverables.list_for_user(user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_decomposition_is_idempotent() {
    let h = harness(vec![Ok(tasks_reply()), Ok(steps_reply())]).await;
    let user_id = Uuid::new_v4();
    seed_profile(&h, user_id).await;

    let response = h
        .coordinator
        .dispatch(
            CoordinatorAction::AnalyzeAndGenerateTasks,
            json!({ "user_id": user_id }),
        )
        .await
        .unwrap();
    let task_id = response["tasks"][0]["id"].clone();

    let first = h
        .coordinator
        .dispatch(
            CoordinatorAction::CreateTaskSteps,
            json!({ "user_id": user_id, "task_id": task_id }),
        )
        .await
        .unwrap();
    let second = h
        .coordinator
        .dispatch(
            CoordinatorAction::CreateTaskSteps,
            json!({ "user_id": user_id, "task_id": task_id }),
        )
        .await
        .unwrap();

    assert_eq!(second["existing"], true);
    assert_eq!(first["steps"], second["steps"]);
}

#[tokio::test]
async fn test_capacity_ceiling_holds() {
    let h = harness(vec![Ok(tasks_reply())]).await;
    let user_id = Uuid::new_v4();
    seed_profile(&h, user_id).await;

    for i in 0..15 {
        let task = Task::new(
            user_id,
            AgentKind::OperationsSpecialist,
            format!("Seed {i}"),
            "d",
        )
        .with_priority(4);
        h.tasks.insert(&task).await.unwrap();
    }

    h.coordinator
        .dispatch(
            CoordinatorAction::AnalyzeAndGenerateTasks,
            json!({ "user_id": user_id }),
        )
        .await
        .unwrap();

    let active = h.tasks.count_active(user_id).await.unwrap();
    assert!(active <= 15, "active count {active} breached the ceiling");
}

#[tokio::test]
async fn test_degraded_generation_uses_fallback() {
    let h = harness(vec![Err(401)]).await;
    let user_id = Uuid::new_v4();
    seed_profile(&h, user_id).await;

    let response = h
        .coordinator
        .dispatch(
            CoordinatorAction::AnalyzeAndGenerateTasks,
            json!({ "user_id": user_id }),
        )
        .await
        .unwrap();

    assert_eq!(response["degraded"], true);
    let tasks = response["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Validate your business concept");
}

#[tokio::test]
async fn test_synthesis_failure_leaves_task_alone() {
    let h = harness(vec![Err(500)]).await;
    let user_id = Uuid::new_v4();
    seed_profile(&h, user_id).await;

    let mut task = Task::new(user_id, AgentKind::LegalAdvisor, "Register", "d");
    task.transition_to(TaskStatus::Completed).unwrap();
    h.tasks.insert(&task).await.unwrap();

    let err = h
        .coordinator
        .dispatch(
            CoordinatorAction::GenerateDeliverable,
            json!({
                "user_id": user_id,
                "task_id": task.id,
                "answers": [{"question": "What entity type?", "answer": "Sole proprietor"}],
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::SynthesisFailed(_)));
    let stored = h.tasks.get(task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.completed_at, task.completed_at);
    assert!(h.deliverables.list_for_task(task.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_evolution_never_duplicates_titles() {
    let h = harness(vec![Ok("not json".to_string())]).await;
    let user_id = Uuid::new_v4();
    seed_profile(&h, user_id).await;

    for title in ["Open account", "Set prices"] {
        let mut t = Task::new(user_id, AgentKind::FinancialManagement, title, "d");
        t.transition_to(TaskStatus::Completed).unwrap();
        h.tasks.insert(&t).await.unwrap();
    }
    let mut legal = Task::new(user_id, AgentKind::LegalAdvisor, "Pick entity type", "d");
    legal.transition_to(TaskStatus::Completed).unwrap();
    h.tasks.insert(&legal).await.unwrap();

    let response = h
        .coordinator
        .dispatch(
            CoordinatorAction::GenerateIntelligentRecommendations,
            json!({ "user_id": user_id }),
        )
        .await
        .unwrap();

    let recs = response["recommendations"].as_array().unwrap();
    assert!(!recs.is_empty());

    let existing: Vec<String> = h
        .tasks
        .list_completed(user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title.to_lowercase())
        .collect();
    for rec in recs {
        let title = rec["title"].as_str().unwrap().to_lowercase();
        assert!(!existing.contains(&title), "duplicate recommendation {title}");
    }
}

#[tokio::test]
async fn test_evolve_tasks_promotes_candidates() {
    let h = harness(vec![Ok("not json".to_string())]).await;
    let user_id = Uuid::new_v4();
    seed_profile(&h, user_id).await;

    for title in ["Open account", "Set prices"] {
        let mut t = Task::new(user_id, AgentKind::FinancialManagement, title, "d");
        t.transition_to(TaskStatus::Completed).unwrap();
        h.tasks.insert(&t).await.unwrap();
    }
    let mut legal = Task::new(user_id, AgentKind::LegalAdvisor, "Pick entity type", "d");
    legal.transition_to(TaskStatus::Completed).unwrap();
    h.tasks.insert(&legal).await.unwrap();

    let response = h
        .coordinator
        .dispatch(CoordinatorAction::EvolveTasks, json!({ "user_id": user_id }))
        .await
        .unwrap();

    let promoted = response["tasks"].as_array().unwrap();
    assert_eq!(promoted.len(), 2);
    assert_eq!(h.tasks.count_active(user_id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_coaching_and_progress_need_no_profile() {
    let h = harness(vec![Ok(tasks_reply())]).await;
    let user_id = Uuid::new_v4();

    let message = h
        .coordinator
        .dispatch(
            CoordinatorAction::GetCoachingMessage,
            json!({ "user_id": user_id }),
        )
        .await
        .unwrap();
    assert!(message["message"].as_str().unwrap().contains("Welcome"));

    let progress = h
        .coordinator
        .dispatch(
            CoordinatorAction::AnalyzeProgress,
            json!({ "user_id": user_id }),
        )
        .await
        .unwrap();
    assert_eq!(progress["total_tasks"], 0);
}

#[tokio::test]
async fn test_questions_for_task() {
    let questions = json!([
        {"question": "Who buys from you today?", "purpose": "audience"},
        {"question": "What is your best seller?", "purpose": "focus"},
        {"question": "What margin do you make on it?", "purpose": "economics"}
    ])
    .to_string();
    let h = harness(vec![Ok(questions)]).await;
    let user_id = Uuid::new_v4();
    seed_profile(&h, user_id).await;

    let task = Task::new(user_id, AgentKind::MarketingSpecialist, "Find customers", "d");
    h.tasks.insert(&task).await.unwrap();

    let response = h
        .coordinator
        .dispatch(
            CoordinatorAction::GenerateIntelligentQuestions,
            json!({ "user_id": user_id, "task_id": task.id }),
        )
        .await
        .unwrap();
    assert_eq!(response["questions"].as_array().unwrap().len(), 3);
    assert_eq!(response["questions"][0]["question"], "Who buys from you today?");
    assert_eq!(response["questions"][0]["purpose"], "audience");
}

#[tokio::test]
async fn test_questions_scoped_to_owner() {
    let h = harness(vec![Ok("not json".to_string())]).await;
    let user_id = Uuid::new_v4();
    seed_profile(&h, user_id).await;

    let foreign = Task::new(
        Uuid::new_v4(),
        AgentKind::MarketingSpecialist,
        "Find customers",
        "d",
    );
    h.tasks.insert(&foreign).await.unwrap();

    let err = h
        .coordinator
        .dispatch(
            CoordinatorAction::GenerateIntelligentQuestions,
            json!({ "user_id": user_id, "task_id": foreign.id }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::TaskNotFound(_)));
}
