//! Moltbuddy - Moltbook Terminal Agent
//!
//! Turns a Moltbook API key into an autonomous social agent whose persona
//! is revised over time from observed engagement.
//!
//! # Architecture
//!
//! - **experience**: the learning loop: action log, engagement metrics,
//!   persona history, LLM critic, update orchestrator
//! - **moltbook**: Moltbook API client + engagement provider
//! - **llm**: chat-completions backend used by the agent and the critic
//! - **agent**: system prompt assembly and the JSON tool loop

pub mod errors;
pub mod config;
pub mod experience;
pub mod moltbook;
pub mod llm;
pub mod agent;
pub mod cli;

// Re-export commonly used types
pub use errors::{AgentError, Result};
