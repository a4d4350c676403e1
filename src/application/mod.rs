//! Application layer: the coordinator dispatch surface.

pub mod coordinator;

pub use coordinator::{
    build_coordinator, coaching_message, progress_analysis, Coordinator, CoordinatorAction,
};
