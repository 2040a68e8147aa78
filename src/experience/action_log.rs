//! Append-only action log
//!
//! Every side-effecting agent action (post, comment, upvote, follow) is
//! recorded as one JSON line for experience tracking. Records are never
//! rewritten or reordered; readers skip lines that fail to parse so a
//! corrupt record never blocks access to the rest of the log.

use crate::errors::{AgentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One logged agent action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    /// UTC instant of the action, ISO-8601 on the wire
    pub timestamp: DateTime<Utc>,

    /// Action tag, e.g. "create_post", "upvote_post", "follow_agent"
    pub action_type: String,

    /// Insertion-ordered map of scalar details about the action
    pub details: Map<String, Value>,
}

/// Append-only durable record of agent actions
#[derive(Debug, Clone)]
pub struct ActionLog {
    path: PathBuf,
    enabled: bool,
}

impl ActionLog {
    /// Create a handle over the log at `path`. When `enabled` is false,
    /// `append` is a no-op (learning disabled), not an error.
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log an agent action as a new trailing record.
    ///
    /// Returns only after the record is written and synced; an I/O
    /// failure propagates so a lost write is never reported as success.
    pub fn append(&self, action_type: &str, details: Map<String, Value>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let event = ActionEvent {
            timestamp: Utc::now(),
            action_type: action_type.to_string(),
            details,
        };
        self.append_event(&event)
    }

    /// Append a fully formed event. Used by `append` and by tests that
    /// need control over timestamps.
    pub fn append_event(&self, event: &ActionEvent) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.storage_error(source))?;
        }

        // One write call for the whole line keeps the record atomic
        // relative to concurrent appenders.
        let mut line = serde_json::to_string(event)?;
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

    /// Load all logged actions in file (append) order.
    ///
    /// A missing log yields an empty list; malformed lines are skipped.
    pub fn load(&self) -> Result<Vec<ActionEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        let mut events = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ActionEvent>(line) {
                Ok(event) => events.push(event),
                Err(_) => continue,
            }
        }
        Ok(events)
    }

    fn storage_error(&self, source: std::io::Error) -> AgentError {
        AgentError::StorageWrite {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn details(pairs: &[(&str, Value)]) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, value) in pairs {
            map.insert(key.to_string(), value.clone());
        }
        map
    }

    fn test_log(dir: &TempDir) -> ActionLog {
        ActionLog::new(dir.path().join("action_log.jsonl"), true)
    }

    #[test]
    fn test_append_and_load_in_order() {
        let dir = TempDir::new().unwrap();
        let log = test_log(&dir);

        log.append("create_post", details(&[("submolt", json!("general"))]))
            .unwrap();
        log.append("upvote_post", details(&[("post_id", json!("p1"))]))
            .unwrap();
        log.append("follow_agent", details(&[("agent_name", json!("crab"))]))
            .unwrap();

        let events = log.load().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].action_type, "create_post");
        assert_eq!(events[1].action_type, "upvote_post");
        assert_eq!(events[2].action_type, "follow_agent");
        assert_eq!(events[2].details["agent_name"], json!("crab"));
    }

    #[test]
    fn test_disabled_log_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("action_log.jsonl");
        let log = ActionLog::new(path.clone(), false);

        log.append("create_post", Map::new()).unwrap();

        assert!(!path.exists());
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let log = test_log(&dir);
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let log = test_log(&dir);

        log.append("create_post", Map::new()).unwrap();
        {
            let mut file = OpenOptions::new()
                .append(true)
                .open(log.path())
                .unwrap();
            writeln!(file, "{{not json").unwrap();
            writeln!(file).unwrap();
            writeln!(file, "42").unwrap();
        }
        log.append("upvote_post", Map::new()).unwrap();

        let events = log.load().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action_type, "create_post");
        assert_eq!(events[1].action_type, "upvote_post");
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let dir = TempDir::new().unwrap();
        let log = test_log(&dir);

        let event = ActionEvent {
            timestamp: Utc::now(),
            action_type: "create_comment".to_string(),
            details: details(&[
                ("post_id", json!("p9")),
                ("content", json!("hello")),
                ("parent_id", json!(null)),
            ]),
        };
        log.append_event(&event).unwrap();

        let loaded = log.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], event);
    }
}
