//! Experience-driven persona learning
//!
//! The agent's actions are logged, engagement is fetched from Moltbook,
//! a chosen metric is computed, and an LLM critic proposes persona
//! updates. Persona history is persisted so the evolution is auditable.

pub mod action_log;
pub mod metrics;
pub mod history;
pub mod resolver;
pub mod critic;
pub mod updater;

pub use action_log::{ActionEvent, ActionLog};
pub use critic::{summarize_actions, Critic, CriticModel, NO_ACTIONS_SUMMARY};
pub use history::{PersonaHistory, PersonaRevision};
pub use metrics::{compute_metric, EngagementSnapshot, Metric, DEFAULT_METRIC};
pub use resolver::resolve_persona;
pub use updater::{
    actions_since_last_revision, update_due, EngagementProvider, PersonaUpdater, UpdateOutcome,
    UpdatePhase,
};
