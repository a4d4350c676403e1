//! Adapter implementations of the domain ports.

pub mod openai;
pub mod sqlite;
