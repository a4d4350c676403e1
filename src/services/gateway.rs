//! Completion gateway.
//!
//! Single choke point between the services and the completion client:
//! applies the call timeout and retry policy, strips prose and code fences
//! from replies, validates parsed output against the prompt's declared
//! shape, and substitutes deterministic fallbacks for the operations that
//! carry one. Operations without a fallback (document synthesis) surface
//! a `GatewayError` instead.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::models::{clamp_priority, AgentKind, StepInputKind};
use crate::domain::ports::{CompletionClient, CompletionError, CompletionRequest};
use crate::services::prompt::{OutputShape, Prompt};
use crate::services::retry::RetryPolicy;

/// Outcome of a fallback-carrying generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated<T> {
    /// Model output parsed and validated.
    Ok(T),
    /// Upstream degraded or produced invalid output; deterministic value
    /// substituted.
    Fallback(T),
}

impl<T> Generated<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Ok(v) | Self::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Completion service unavailable: {0}")]
    Upstream(#[from] CompletionError),

    #[error("Model output did not match the expected shape: {0}")]
    InvalidOutput(String),
}

/// Raw task object as the model emits it.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub estimated_effort: Option<String>,
}

impl TaskDraft {
    pub fn agent_kind(&self) -> AgentKind {
        self.agent
            .as_deref()
            .map(AgentKind::from_model_output)
            .unwrap_or(AgentKind::OperationsSpecialist)
    }

    pub fn clamped_priority(&self) -> u8 {
        clamp_priority(self.priority)
    }
}

/// Raw step object as the model emits it.
#[derive(Debug, Clone, Deserialize)]
pub struct StepDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub validation_criteria: Option<serde_json::Value>,
    #[serde(default)]
    pub guidance: Option<String>,
}

impl StepDraft {
    pub fn input_kind(&self) -> StepInputKind {
        self.input_type
            .as_deref()
            .map(StepInputKind::from_model_output)
            .unwrap_or_default()
    }
}

/// Serialized straight into dispatch responses, unlike the other drafts
/// which convert into domain types first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question: String,
    pub purpose: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl RecommendationDraft {
    pub fn agent_kind(&self) -> AgentKind {
        self.agent
            .as_deref()
            .map(AgentKind::from_model_output)
            .unwrap_or(AgentKind::OperationsSpecialist)
    }
}

#[derive(Clone)]
pub struct CompletionGateway {
    client: Arc<dyn CompletionClient>,
    retry: RetryPolicy,
    call_timeout: Duration,
    max_tokens: usize,
}

impl CompletionGateway {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        retry: RetryPolicy,
        call_timeout: Duration,
        max_tokens: usize,
    ) -> Self {
        Self {
            client,
            retry,
            call_timeout,
            max_tokens,
        }
    }

    async fn complete_raw(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        let request = CompletionRequest::new(prompt.text.clone(), self.max_tokens);
        let timeout_secs = self.call_timeout.as_secs();

        self.retry
            .execute(|| {
                let request = request.clone();
                async move {
                    tokio::time::timeout(self.call_timeout, self.client.complete(&request))
                        .await
                        .map_err(|_| CompletionError::Timeout(timeout_secs))?
                }
            })
            .await
    }

    /// Run an array-producing generation, substituting `fallback` when the
    /// upstream degrades or the output fails shape validation.
    async fn generate_array<T: DeserializeOwned>(
        &self,
        prompt: &Prompt,
        fallback: Vec<T>,
    ) -> Generated<Vec<T>> {
        match self.try_generate_array(prompt).await {
            Ok(items) => Generated::Ok(items),
            Err(err) => {
                warn!(error = %err, "Generation degraded, using fallback");
                Generated::Fallback(fallback)
            }
        }
    }

    async fn try_generate_array<T: DeserializeOwned>(
        &self,
        prompt: &Prompt,
    ) -> Result<Vec<T>, GatewayError> {
        let raw = self.complete_raw(prompt).await?;
        let json = extract_json(&raw);

        let value: serde_json::Value = serde_json::from_str(&json)
            .map_err(|e| GatewayError::InvalidOutput(e.to_string()))?;

        validate_shape(&value, prompt.shape)?;

        serde_json::from_value(value).map_err(|e| GatewayError::InvalidOutput(e.to_string()))
    }

    pub async fn generate_tasks(&self, prompt: &Prompt) -> Generated<Vec<TaskDraft>> {
        debug!("Generating tasks");
        self.generate_array(prompt, fallback_tasks()).await
    }

    pub async fn generate_steps(
        &self,
        prompt: &Prompt,
        task_title: &str,
    ) -> Generated<Vec<StepDraft>> {
        debug!(task_title, "Generating steps");
        self.generate_array(prompt, fallback_steps(task_title)).await
    }

    pub async fn generate_questions(&self, prompt: &Prompt) -> Generated<Vec<QuestionDraft>> {
        debug!("Generating questions");
        self.generate_array(prompt, fallback_questions()).await
    }

    pub async fn generate_recommendations(
        &self,
        prompt: &Prompt,
    ) -> Generated<Vec<RecommendationDraft>> {
        debug!("Generating recommendations");
        self.generate_array(prompt, fallback_recommendations()).await
    }

    /// Document synthesis has no fallback; failures surface to the caller.
    pub async fn generate_document(&self, prompt: &Prompt) -> Result<String, GatewayError> {
        debug!("Generating document");
        let raw = self.complete_raw(prompt).await?;
        let text = strip_code_fences(&raw);
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidOutput("Empty document".to_string()));
        }
        Ok(text)
    }
}

/// Pull the first JSON array or object out of a reply that may be wrapped
/// in prose or markdown code fences.
pub fn extract_json(response: &str) -> String {
    let trimmed = strip_code_fences(response);
    let trimmed = trimmed.trim();

    if (trimmed.starts_with('[') && trimmed.ends_with(']'))
        || (trimmed.starts_with('{') && trimmed.ends_with('}'))
    {
        return trimmed.to_string();
    }

    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if end > start {
                return trimmed[start..=end].to_string();
            }
        }
    }

    trimmed.to_string()
}

fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("markdown"))
            .unwrap_or(rest);
        let rest = rest.strip_suffix("```").unwrap_or(rest);
        return rest.trim().to_string();
    }
    trimmed.to_string()
}

fn validate_shape(value: &serde_json::Value, shape: OutputShape) -> Result<(), GatewayError> {
    let OutputShape::ObjectArray {
        min,
        max,
        required_fields,
    } = shape
    else {
        return Ok(());
    };

    let items = value
        .as_array()
        .ok_or_else(|| GatewayError::InvalidOutput("Expected a JSON array".to_string()))?;

    if items.len() < min || items.len() > max {
        return Err(GatewayError::InvalidOutput(format!(
            "Expected {min}..={max} items, got {}",
            items.len()
        )));
    }

    for (i, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            GatewayError::InvalidOutput(format!("Item {i} is not an object"))
        })?;
        for field in required_fields {
            let present = obj
                .get(*field)
                .and_then(serde_json::Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !present {
                return Err(GatewayError::InvalidOutput(format!(
                    "Item {i} missing required field {field}"
                )));
            }
        }
    }

    Ok(())
}

/// The fixed high-priority task assigned when generation degrades.
pub fn fallback_tasks() -> Vec<TaskDraft> {
    vec![TaskDraft {
        title: "Validate your business concept".to_string(),
        description: "Talk to five potential customers this week. Ask what they \
                      currently do about the problem you solve, what it costs \
                      them, and whether they would pay for your solution. Write \
                      down every answer."
            .to_string(),
        agent: Some(AgentKind::OperationsSpecialist.as_str().to_string()),
        priority: Some(1),
        estimated_effort: Some("1 week".to_string()),
    }]
}

/// Generic three-step plan; every task ends up with at least one step.
pub fn fallback_steps(task_title: &str) -> Vec<StepDraft> {
    vec![
        StepDraft {
            title: "Describe your starting point".to_string(),
            description: format!(
                "Write down where you are today with \"{task_title}\" and what \
                 is blocking you."
            ),
            input_type: Some("text".to_string()),
            validation_criteria: None,
            guidance: Some("Be concrete: numbers, names, dates.".to_string()),
        },
        StepDraft {
            title: "Do the work".to_string(),
            description: format!("Carry out \"{task_title}\" and note what you did."),
            input_type: Some("text".to_string()),
            validation_criteria: None,
            guidance: Some("Small, finished actions beat big plans.".to_string()),
        },
        StepDraft {
            title: "Record the outcome".to_string(),
            description: "Summarize the result and the next decision it unlocks.".to_string(),
            input_type: Some("text".to_string()),
            validation_criteria: None,
            guidance: Some("One paragraph is enough.".to_string()),
        },
    ]
}

pub fn fallback_questions() -> Vec<QuestionDraft> {
    vec![
        QuestionDraft {
            question: "Who exactly is the customer you are trying to reach, and where do they spend their time?".to_string(),
            purpose: "Anchors the document to a concrete audience".to_string(),
        },
        QuestionDraft {
            question: "What have you already tried for this task, and what happened?".to_string(),
            purpose: "Avoids recommending work that was already done".to_string(),
        },
        QuestionDraft {
            question: "What would success look like for you in 30 days?".to_string(),
            purpose: "Sets the target the document should build toward".to_string(),
        },
    ]
}

pub fn fallback_recommendations() -> Vec<RecommendationDraft> {
    vec![
        RecommendationDraft {
            title: "Review your pricing and margins".to_string(),
            description: "Check that every product or service covers its cost with room to grow.".to_string(),
            agent: Some(AgentKind::FinancialManagement.as_str().to_string()),
            priority: Some(2),
            rationale: Some("Sound unit economics underpin every next move".to_string()),
        },
        RecommendationDraft {
            title: "Ask three customers for feedback".to_string(),
            description: "Short conversations with recent customers about what to improve next.".to_string(),
            agent: Some(AgentKind::MarketingSpecialist.as_str().to_string()),
            priority: Some(3),
            rationale: Some("Direct feedback beats guessing at the roadmap".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prompt::{compile_task_generation, TASK_FIELDS};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    use crate::domain::models::{MaturityScores, TaskHistory, UnifiedProfile};

    struct FakeClient {
        replies: Vec<Result<String, u16>>,
        calls: AtomicU32,
    }

    impl FakeClient {
        fn new(replies: Vec<Result<String, u16>>) -> Self {
            Self {
                replies,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for FakeClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.replies.get(n.min(self.replies.len() - 1)) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(status)) => Err(CompletionError::from_status(*status, "boom".to_string())),
                None => Err(CompletionError::NetworkError("no reply".to_string())),
            }
        }
    }

    fn gateway_with(replies: Vec<Result<String, u16>>) -> CompletionGateway {
        CompletionGateway::new(
            Arc::new(FakeClient::new(replies)),
            RetryPolicy::new(1, 1, 2),
            Duration::from_secs(5),
            1024,
        )
    }

    fn test_prompt() -> Prompt {
        let profile = UnifiedProfile {
            user_id: Uuid::new_v4(),
            profile: None,
            maturity: Some(MaturityScores::new(10, 20, 30, 40)),
            history: TaskHistory::default(),
        };
        compile_task_generation(&profile)
    }

    fn valid_reply() -> String {
        serde_json::json!([
            {"title": "Open a business bank account", "description": "Separate finances", "agent": "financial-management", "priority": 1},
            {"title": "Set up Instagram", "description": "Create the account", "agent": "marketing-specialist", "priority": 9}
        ])
        .to_string()
    }

    #[tokio::test]
    async fn test_parses_valid_output() {
        let gateway = gateway_with(vec![Ok(valid_reply())]);
        let result = gateway.generate_tasks(&test_prompt()).await;

        assert!(!result.is_fallback());
        let tasks = result.into_inner();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].agent_kind(), AgentKind::FinancialManagement);
        // Out-of-range priority clamps rather than rejecting the batch
        assert_eq!(tasks[1].clamped_priority(), 5);
    }

    #[tokio::test]
    async fn test_fenced_and_prosed_output_parses() {
        let reply = format!("Here are the tasks:\n```json\n{}\n```", valid_reply());
        let gateway = gateway_with(vec![Ok(reply)]);
        let result = gateway.generate_tasks(&test_prompt()).await;
        assert!(!result.is_fallback());
    }

    #[tokio::test]
    async fn test_transient_error_retried_then_ok() {
        let gateway = gateway_with(vec![Err(503), Ok(valid_reply())]);
        let result = gateway.generate_tasks(&test_prompt()).await;
        assert!(!result.is_fallback());
    }

    #[tokio::test]
    async fn test_permanent_failure_falls_back() {
        let gateway = gateway_with(vec![Err(401)]);
        let result = gateway.generate_tasks(&test_prompt()).await;

        assert!(result.is_fallback());
        let tasks = result.into_inner();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Validate your business concept");
        assert_eq!(tasks[0].clamped_priority(), 1);
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let gateway = gateway_with(vec![Ok("I cannot answer that.".to_string())]);
        let result = gateway.generate_tasks(&test_prompt()).await;
        assert!(result.is_fallback());
    }

    #[tokio::test]
    async fn test_missing_required_field_falls_back() {
        let reply = serde_json::json!([{"description": "no title here"}]).to_string();
        let gateway = gateway_with(vec![Ok(reply)]);
        let result = gateway.generate_tasks(&test_prompt()).await;
        assert!(result.is_fallback());
    }

    #[tokio::test]
    async fn test_document_failure_surfaces_error() {
        let gateway = gateway_with(vec![Err(500)]);
        let prompt = Prompt {
            text: "write".to_string(),
            shape: OutputShape::Document,
        };
        let err = gateway.generate_document(&prompt).await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_document_strips_fences() {
        let gateway =
            gateway_with(vec![Ok("```markdown\n# Plan\nBody\n```".to_string())]);
        let prompt = Prompt {
            text: "write".to_string(),
            shape: OutputShape::Document,
        };
        let doc = gateway.generate_document(&prompt).await.unwrap();
        assert!(doc.starts_with("# Plan"));
        assert!(!doc.contains("```"));
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json("[1,2]"), "[1,2]");
        assert_eq!(extract_json("Sure! [1,2] there."), "[1,2]");
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_question_drafts_render_to_json() {
        // Questions go back to the caller as-is, so they must serialize
        let value = serde_json::to_value(fallback_questions()).unwrap();
        assert!(value[0]["question"].as_str().is_some());
        assert!(value[0]["purpose"].as_str().is_some());
    }

    #[test]
    fn test_shape_validation_bounds() {
        let shape = OutputShape::ObjectArray {
            min: 1,
            max: 2,
            required_fields: TASK_FIELDS,
        };
        let too_many = serde_json::json!([
            {"title": "a", "description": "d", "agent": "x"},
            {"title": "b", "description": "d", "agent": "x"},
            {"title": "c", "description": "d", "agent": "x"}
        ]);
        assert!(validate_shape(&too_many, shape).is_err());
    }
}
