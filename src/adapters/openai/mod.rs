//! OpenAI adapter implementing the completion client port.

pub mod client;

pub use client::{OpenAiClient, OpenAiClientConfig};
