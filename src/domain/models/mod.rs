//! Domain models for the maestro orchestration engine.

pub mod agent;
pub mod config;
pub mod deliverable;
pub mod profile;
pub mod recommendation;
pub mod step;
pub mod task;

pub use agent::AgentKind;
pub use config::{CompletionConfig, Config, DatabaseConfig, LoggingConfig, RetryConfig};
pub use deliverable::Deliverable;
pub use profile::{BusinessProfile, MaturityScores, TaskHistory, UnifiedProfile};
pub use recommendation::{titles_match, CandidateSource, RecommendationCandidate};
pub use step::{steps_are_contiguous, StepInputKind, StepStatus, TaskStep};
pub use task::{clamp_priority, Task, TaskStatus, PRIORITY_HIGHEST, PRIORITY_LOWEST};
