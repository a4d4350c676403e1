//! Maestro - Adaptive Task Orchestration Engine
//!
//! Maestro turns a founder's business profile and maturity assessment into
//! an evolving stream of coaching tasks: it fuses context, compiles prompts,
//! calls a completion service with retry and deterministic fallbacks,
//! governs per-user task capacity, decomposes tasks into input-capturing
//! steps, and synthesizes finished working documents from the founder's own
//! answers.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, ports, and errors
//! - **Service Layer** (`services`): Profile fusion, prompt compilation,
//!   the completion gateway, capacity governance, task writing, step
//!   decomposition and tracking, deliverable synthesis, and the evolution
//!   engine
//! - **Application Layer** (`application`): The coordinator dispatch surface
//! - **Adapters** (`adapters`): SQLite repositories and the OpenAI client
//! - **Infrastructure Layer** (`infrastructure`): Config loading and tracing

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{build_coordinator, Coordinator, CoordinatorAction};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AgentKind, BusinessProfile, Config, Deliverable, MaturityScores, RecommendationCandidate,
    Task, TaskStatus, TaskStep, UnifiedProfile,
};
pub use services::{CompletionGateway, Generated, RetryPolicy};
