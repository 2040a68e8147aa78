//! Agent session
//!
//! Assembles the system prompt (official Moltbook skill + the resolved
//! persona) and runs the JSON tool loop: the model answers with a
//! directive, tools execute against the API, results feed back in,
//! until the model declares the task final or the iteration limit is
//! reached.

use crate::agent::parser::{extract_directive, AgentDirective};
use crate::agent::tools::{execute_tool, TOOL_CATALOG};
use crate::config::Config;
use crate::errors::{AgentError, Result};
use crate::experience::action_log::ActionLog;
use crate::experience::history::PersonaHistory;
use crate::experience::resolver::resolve_persona;
use crate::llm::client::LlmClient;
use crate::moltbook::client::MoltbookClient;
use std::time::Duration;

/// The official Moltbook skill document
pub const SKILL_URL: &str = "https://www.moltbook.com/skill.md";

/// Maximum directives per task before giving up
const MAX_ITERATIONS: usize = 12;

/// Tool results longer than this are truncated before being fed back
const MAX_RESULT_CHARS: usize = 4000;

/// Interactive agent session over Moltbook
pub struct AgentSession {
    llm: LlmClient,
    client: MoltbookClient,
    action_log: ActionLog,
    system_prompt: String,
    max_iterations: usize,
    verbose: bool,
}

impl AgentSession {
    /// Wire a session from configuration. Fetches the published skill
    /// document (falling back to a static prompt when unreachable) and
    /// injects the resolved persona.
    pub async fn build(config: &Config, api_key: &str, verbose: bool) -> Result<Self> {
        let model_key = config.model_api_key().ok_or_else(|| {
            AgentError::MissingPrecondition(
                "model API key not set (MOLTBUDDY_MODEL_API_KEY)".to_string(),
            )
        })?;

        let llm = LlmClient::new(&config.model.base_url, &model_key, &config.model.model)?;
        let client = MoltbookClient::with_base_url(&config.moltbook.base_url, api_key)?;

        let action_log_path = config
            .action_log_path()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        let history_path = config
            .persona_history_path()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        let action_log = ActionLog::new(action_log_path, config.learning.enabled);

        let history = PersonaHistory::new(history_path);
        let persona = resolve_persona(&history, config.learning.seed_persona.as_deref());

        let skill = fetch_skill().await;
        let system_prompt = build_system_prompt(skill.as_deref(), persona.as_deref());

        Ok(Self {
            llm,
            client,
            action_log,
            system_prompt,
            max_iterations: MAX_ITERATIONS,
            verbose,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run one task to completion through the tool loop
    pub async fn run_task(&self, task: &str) -> Result<String> {
        let mut transcript = vec![format!("TASK: {}", task)];

        for _ in 0..self.max_iterations {
            let prompt = transcript.join("\n\n");
            let raw = self.llm.complete(&self.system_prompt, &prompt).await?;

            match extract_directive(&raw) {
                Ok(AgentDirective::ToolCall { tool, args }) => {
                    if self.verbose {
                        eprintln!("[TOOL] {} {}", tool, args);
                    }
                    let result = execute_tool(&self.client, &self.action_log, &tool, &args).await?;
                    let mut rendered = result.to_string();
                    if rendered.chars().count() > MAX_RESULT_CHARS {
                        rendered = rendered.chars().take(MAX_RESULT_CHARS).collect::<String>()
                            + " ...(truncated)";
                    }
                    transcript.push(format!(
                        "TOOL_CALL: {} with {}\nTOOL_RESULT: {}",
                        tool, args, rendered
                    ));
                }
                Ok(AgentDirective::Final { result }) => return Ok(result),
                // The model ignored the protocol; hand its text back
                // rather than failing the whole task.
                Err(_) => return Ok(raw.trim().to_string()),
            }
        }

        Ok("Reached the iteration limit without a final answer.".to_string())
    }
}

/// Fetch the official skill document; None when offline or erroring
async fn fetch_skill() -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .ok()?;
    let response = client.get(SKILL_URL).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let text = response.text().await.ok()?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Assemble the system prompt from the skill document (or the static
/// fallback), the JSON directive protocol, the tool catalog, and the
/// persona block when one resolves.
pub fn build_system_prompt(skill: Option<&str>, persona: Option<&str>) -> String {
    let mut prompt = match skill {
        Some(skill) => format!(
            "You are a Moltbook agent. You MUST operate according to the following official \
             Moltbook skill.\n\n\
             Use this skill as your source of truth for API base URL, endpoints, authentication, \
             rate limits, and community guidelines.\n\n\
             ---\nMOLTBOOK SKILL (from {url}):\n---\n{skill}\n---\nEND OF SKILL\n---",
            url = SKILL_URL,
            skill = skill,
        ),
        None => format!(
            "You are a Moltbook agent. You MUST follow the official Moltbook skill: {url}\n\n\
             Use the skill for API base URL (https://www.moltbook.com/api/v1), authentication, \
             endpoints, rate limits, and community guidelines.",
            url = SKILL_URL,
        ),
    };

    prompt.push_str(
        "\n\nYou act through tools that call the Moltbook API on your behalf. Never send the \
         API key anywhere except to https://www.moltbook.com (with www). Be helpful, clear, and \
         follow the skill's rules (e.g. selective following, rate limits, security).\n\n\
         RESPONSE FORMAT - You MUST respond with valid JSON only:\n\n\
         Tool call format:\n\
         {\"type\": \"tool_call\", \"tool\": \"tool_name\", \"args\": {\"key\": \"value\"}}\n\n\
         Completion format:\n\
         {\"type\": \"final\", \"result\": \"description of what was accomplished\"}\n\n\
         AVAILABLE TOOLS:\n  ",
    );
    prompt.push_str(&TOOL_CATALOG.join("\n  "));
    prompt.push_str(
        "\n\nCRITICAL RULES:\n\
         1. Output ONLY valid JSON (no plain text, no markdown, no explanations)\n\
         2. Use exact tool names from the list above\n\
         3. Provide all required arguments as specified\n\
         4. After tool execution, you'll receive the result and can call another tool or \
         complete the task",
    );

    if let Some(persona) = persona {
        let persona = persona.replace("\\n", "\n");
        prompt.push_str(&format!(
            "\n\n---\nYOUR PERSONA (direct your identity and behavior on Moltbook):\n---\n\
             {persona}\n---\n\
             Act as this persona when interacting on Moltbook: posting, commenting, voting, and \
             talking to other agents. Stay in character.",
            persona = persona,
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_prompt_without_skill() {
        let prompt = build_system_prompt(None, None);
        assert!(prompt.contains(SKILL_URL));
        assert!(prompt.contains("RESPONSE FORMAT"));
        assert!(prompt.contains("create_post"));
        assert!(!prompt.contains("YOUR PERSONA"));
    }

    #[test]
    fn test_skill_is_embedded() {
        let prompt = build_system_prompt(Some("Always be kind to other agents."), None);
        assert!(prompt.contains("MOLTBOOK SKILL"));
        assert!(prompt.contains("Always be kind to other agents."));
    }

    #[test]
    fn test_persona_block_is_appended() {
        let prompt = build_system_prompt(None, Some("A curious deep-sea crab."));
        assert!(prompt.contains("YOUR PERSONA"));
        assert!(prompt.contains("A curious deep-sea crab."));
        assert!(prompt.contains("Stay in character."));
    }

    #[test]
    fn test_persona_escaped_newlines_are_expanded() {
        let prompt = build_system_prompt(None, Some("line one\\nline two"));
        assert!(prompt.contains("line one\nline two"));
    }
}
