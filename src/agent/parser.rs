//! Directive extraction from raw model text
//!
//! The agent protocol asks the model to answer with a single JSON
//! object (`tool_call` or `final`). Models wrap JSON in prose or
//! markdown fences often enough that we extract the first balanced
//! object with a string-aware bracket matcher instead of parsing the
//! raw text directly.

use crate::errors::{AgentError, Result};
use serde_json::Value;

/// A parsed agent directive
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDirective {
    /// Execute a tool and feed the result back
    ToolCall { tool: String, args: Value },

    /// Task complete
    Final { result: String },
}

/// Extract the first balanced JSON object from raw text.
///
/// Single pass; brace depth is tracked outside of string literals, with
/// backslash escapes honored inside them.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &byte) in bytes.iter().enumerate() {
        let ch = byte as char;

        if escape_next {
            escape_next = false;
            continue;
        }

        if in_string {
            match ch {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(start) = start {
                            return Some(&raw[start..=i]);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse the model's answer into a directive
pub fn extract_directive(raw: &str) -> Result<AgentDirective> {
    let json = extract_json_object(raw).ok_or_else(|| {
        AgentError::ModelApi("Response contained no JSON directive".to_string())
    })?;

    let value: Value = serde_json::from_str(json)?;
    let kind = value.get("type").and_then(Value::as_str).unwrap_or("");

    match kind {
        "tool_call" => {
            let tool = value
                .get("tool")
                .and_then(Value::as_str)
                .ok_or_else(|| AgentError::ModelApi("tool_call without a tool name".to_string()))?
                .to_string();
            let args = value.get("args").cloned().unwrap_or(Value::Null);
            Ok(AgentDirective::ToolCall { tool, args })
        }
        "final" => {
            let result = value
                .get("result")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            Ok(AgentDirective::Final { result })
        }
        other => Err(AgentError::ModelApi(format!(
            "Unknown directive type: '{}'",
            other
        ))),
    }
}
