//! Error types for the Moltbuddy agent system

use thiserror::Error;

/// Main error type for the Moltbuddy agent system
#[derive(Error, Debug)]
pub enum AgentError {
    /// Update phase machine errors
    #[error("Invalid phase transition from {from:?} to {to:?}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// A required precondition (credential, persona) is absent
    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),

    /// Moltbook API errors (engagement provider failures included)
    #[error("Moltbook API error: {0}")]
    MoltbookApi(String),

    /// Generative model backend errors
    #[error("Model API error: {0}")]
    ModelApi(String),

    /// Append to a durable log failed; never silently absorbed
    #[error("Storage write failed for {path}: {source}")]
    StorageWrite {
        path: String,
        source: std::io::Error,
    },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
