//! Ports (interfaces) for external dependencies.

pub mod completion_client;
pub mod deliverable_repository;
pub mod profile_repository;
pub mod step_repository;
pub mod task_repository;

pub use completion_client::{CompletionClient, CompletionError, CompletionRequest};
pub use deliverable_repository::DeliverableRepository;
pub use profile_repository::ProfileRepository;
pub use step_repository::StepRepository;
pub use task_repository::TaskRepository;
