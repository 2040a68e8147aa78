//! Active-persona resolution
//!
//! Used by the agent runtime at session start to pick the persona that
//! conditions its behavior.

use crate::experience::history::PersonaHistory;

/// Resolve the active persona: the latest history revision if present
/// and non-empty after trimming, else the configured seed persona, else
/// none (the agent proceeds without persona augmentation).
///
/// Pure read with no side effects; repeated calls with no intervening
/// writes yield the same result.
pub fn resolve_persona(history: &PersonaHistory, seed: Option<&str>) -> Option<String> {
    if let Some(persona) = history.current() {
        if !persona.trim().is_empty() {
            return Some(persona);
        }
    }

    match seed {
        Some(seed) if !seed.trim().is_empty() => Some(seed.trim().to_string()),
        _ => None,
    }
}
