//! Append-only persona history store
//!
//! Each critic run appends one revision; the current persona is the
//! persona field of the last parseable record. Same storage discipline
//! as the action log: records are never rewritten, and a malformed line
//! never blocks the rest of the store.

use crate::errors::{AgentError, Result};
use crate::experience::metrics::Metric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One persona revision produced by an update step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaRevision {
    /// UTC instant the revision was appended, ISO-8601 on the wire
    pub timestamp: DateTime<Utc>,

    /// The revised persona text
    pub persona: String,

    /// Metric that drove the critic run
    pub metric_name: Metric,

    /// Value of that metric at the time of the run
    pub metric_value: f64,

    /// Audit note recording what drove the proposal; no behavioral weight
    pub critic_notes: String,
}

/// Append-only durable record of persona revisions
#[derive(Debug, Clone)]
pub struct PersonaHistory {
    path: PathBuf,
}

impl PersonaHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a revision as a new trailing record.
    ///
    /// Same durability contract as the action log: returns only after
    /// the record is written and synced, and failures propagate.
    pub fn append(&self, revision: &PersonaRevision) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.storage_error(source))?;
        }

        let mut line = serde_json::to_string(revision)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.storage_error(source))?;

        file.write_all(line.as_bytes())
            .map_err(|source| self.storage_error(source))?;
        file.sync_all()
            .map_err(|source| self.storage_error(source))?;

        Ok(())
    }

    /// The persona of the last parseable revision, or None when the
    /// store is empty, missing, unreadable, or entirely malformed.
    pub fn current(&self) -> Option<String> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let mut last = None;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Ok(revision) = serde_json::from_str::<PersonaRevision>(line) {
                last = Some(revision.persona);
            }
        }
        last
    }

    /// Load the full revision history in append order, for inspection
    /// and replay. Malformed lines are skipped; missing file is empty.
    pub fn load_all(&self) -> Result<Vec<PersonaRevision>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        let mut revisions = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<PersonaRevision>(line) {
                Ok(revision) => revisions.push(revision),
                Err(_) => continue,
            }
        }
        Ok(revisions)
    }

    fn storage_error(&self, source: std::io::Error) -> AgentError {
        AgentError::StorageWrite {
            path: self.path.display().to_string(),
            source,
        }
    }
}
