//! Business logic services.

pub mod capacity;
pub mod deliverable_synthesizer;
pub mod evolution;
pub mod gateway;
pub mod profile_fusion;
pub mod prompt;
pub mod retry;
pub mod step_decomposer;
pub mod step_tracker;
pub mod task_writer;

pub use capacity::{plan_evictions, CapacityGovernor, EvictionPolicy, CAPACITY_CEILING, EVICTION_TARGET_FLOOR};
pub use deliverable_synthesizer::{DeliverableSynthesizer, SynthesisSource};
pub use evolution::{rule_candidates, EvolutionEngine};
pub use gateway::{
    extract_json, CompletionGateway, GatewayError, Generated, QuestionDraft, RecommendationDraft,
    StepDraft, TaskDraft,
};
pub use profile_fusion::ProfileFusionService;
pub use prompt::{OutputShape, Prompt};
pub use retry::RetryPolicy;
pub use step_decomposer::{DecomposeOutcome, StepDecomposer};
pub use step_tracker::{StepCompletion, StepTracker};
pub use task_writer::TaskWriter;
