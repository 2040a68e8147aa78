//! LLM critic
//!
//! Asks the generative model to propose a revised persona given the
//! current persona, observed engagement, the metric to maximize, and a
//! bounded summary of recent actions. The prompt is deterministic for a
//! given set of inputs, and the model is invoked exactly once per call.

use crate::errors::Result;
use crate::experience::action_log::ActionEvent;
use crate::experience::metrics::{EngagementSnapshot, Metric};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Number of most recent actions included in the critic prompt
pub const RECENT_ACTIONS_LIMIT: usize = 20;

/// Summary text used when the action log is empty
pub const NO_ACTIONS_SUMMARY: &str = "No actions logged yet.";

/// System instruction for the critic run
pub const CRITIC_SYSTEM_PROMPT: &str = "You are a critic that improves Moltbook agent \
personas. Given the current persona, engagement stats, and the metric we want to maximize, \
output a revised persona (a few sentences or bullet points) that should improve that metric. \
Stay within Moltbook community norms. Output only the new persona text, no preamble.";

/// Backend seam for the generative model
#[async_trait]
pub trait CriticModel: Send + Sync {
    /// One chat completion: system instruction + user prompt in, raw text out.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Render a bounded textual summary of the most recent actions, one
/// line per event, oldest first. Empty input yields the fixed sentinel.
pub fn summarize_actions(actions: &[ActionEvent]) -> String {
    if actions.is_empty() {
        return NO_ACTIONS_SUMMARY.to_string();
    }

    let start = actions.len().saturating_sub(RECENT_ACTIONS_LIMIT);
    actions[start..]
        .iter()
        .map(|action| {
            format!(
                "- {}: {}",
                action.action_type,
                Value::Object(action.details.clone())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Persona critic over a generative model backend
pub struct Critic {
    model: Arc<dyn CriticModel>,
}

impl Critic {
    pub fn new(model: Arc<dyn CriticModel>) -> Self {
        Self { model }
    }

    /// Build the critic prompt. Embeds the current persona verbatim, the
    /// engagement fields, the metric name and value, and the action
    /// summary, in a fixed layout.
    pub fn build_prompt(
        current_persona: &str,
        snapshot: &EngagementSnapshot,
        metric: Metric,
        metric_value: f64,
        action_summary: &str,
    ) -> String {
        format!(
            "Current persona:\n{current_persona}\n\n\
             Engagement we observed:\n\
             - karma: {karma}\n\
             - follower_count: {followers}\n\
             - upvotes on our posts: {upvotes}\n\
             - replies on our posts: {replies}\n\
             - recent posts count: {posts}\n\n\
             Metric we want to maximize: {metric}\n\
             Current metric value: {metric_value}\n\n\
             Recent actions summary:\n{action_summary}\n\n\
             Propose a revised persona that would likely improve {metric}. \
             Output only the new persona text, no explanation.",
            current_persona = current_persona,
            karma = snapshot.karma,
            followers = snapshot.follower_count,
            upvotes = snapshot.upvotes_received,
            replies = snapshot.replies_received,
            posts = snapshot.posts_count,
            metric = metric,
            metric_value = metric_value,
            action_summary = action_summary,
        )
    }

    /// Propose a revised persona. Returns `(new_persona, critic_notes)`.
    ///
    /// The model's raw output is trimmed; if the result is empty the
    /// input persona is returned unchanged so the step still appends an
    /// explicit no-op revision. A model failure propagates; no retry.
    pub async fn propose(
        &self,
        current_persona: &str,
        snapshot: &EngagementSnapshot,
        metric: Metric,
        metric_value: f64,
        action_summary: &str,
    ) -> Result<(String, String)> {
        let prompt = Self::build_prompt(
            current_persona,
            snapshot,
            metric,
            metric_value,
            action_summary,
        );

        let raw = self.model.complete(CRITIC_SYSTEM_PROMPT, &prompt).await?;
        let proposed = raw.trim();

        let new_persona = if proposed.is_empty() {
            current_persona.to_string()
        } else {
            proposed.to_string()
        };
        let critic_notes = format!(
            "Metric: {}={}; critic proposed update.",
            metric.name(),
            metric_value
        );

        Ok((new_persona, critic_notes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentError;
    use chrono::Utc;
    use serde_json::{json, Map};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedModel {
        reply: String,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CriticModel for FixedModel {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl CriticModel for FailingModel {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
            Err(AgentError::ModelApi("backend down".to_string()))
        }
    }

    fn event(action_type: &str) -> ActionEvent {
        let mut details = Map::new();
        details.insert("post_id".to_string(), json!("p1"));
        ActionEvent {
            timestamp: Utc::now(),
            action_type: action_type.to_string(),
            details,
        }
    }

    fn snapshot() -> EngagementSnapshot {
        EngagementSnapshot {
            karma: 10.0,
            follower_count: 2,
            following_count: 1,
            upvotes_received: 5.0,
            replies_received: 3.0,
            posts_count: 4,
        }
    }

    #[test]
    fn test_empty_log_summary_is_sentinel() {
        assert_eq!(summarize_actions(&[]), NO_ACTIONS_SUMMARY);
    }

    #[test]
    fn test_summary_is_bounded_to_recent_actions() {
        let actions: Vec<ActionEvent> = (0..30).map(|_| event("upvote_post")).collect();
        let summary = summarize_actions(&actions);
        assert_eq!(summary.lines().count(), RECENT_ACTIONS_LIMIT);
        assert!(summary.lines().all(|line| line.starts_with("- upvote_post:")));
    }

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = Critic::build_prompt(
            "a curious crab",
            &snapshot(),
            Metric::Engagement,
            8.0,
            NO_ACTIONS_SUMMARY,
        );
        assert!(prompt.contains("a curious crab"));
        assert!(prompt.contains("- karma: 10"));
        assert!(prompt.contains("- follower_count: 2"));
        assert!(prompt.contains("Metric we want to maximize: engagement"));
        assert!(prompt.contains("Current metric value: 8"));
        assert!(prompt.contains(NO_ACTIONS_SUMMARY));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = Critic::build_prompt("p", &snapshot(), Metric::Karma, 10.0, "- x: {}");
        let b = Critic::build_prompt("p", &snapshot(), Metric::Karma, 10.0, "- x: {}");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_propose_trims_model_output() {
        let model = FixedModel::new("  a bolder, funnier crab  \n");
        let critic = Critic::new(model.clone());

        let (persona, notes) = critic
            .propose("old persona", &snapshot(), Metric::Engagement, 8.0, "none")
            .await
            .unwrap();

        assert_eq!(persona, "a bolder, funnier crab");
        assert_eq!(notes, "Metric: engagement=8; critic proposed update.");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_output_falls_back_to_current_persona() {
        let model = FixedModel::new("   \n\t");
        let critic = Critic::new(model);

        let (persona, _) = critic
            .propose("old persona", &snapshot(), Metric::Engagement, 8.0, "none")
            .await
            .unwrap();

        assert_eq!(persona, "old persona");
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let critic = Critic::new(Arc::new(FailingModel));
        let result = critic
            .propose("old persona", &snapshot(), Metric::Engagement, 8.0, "none")
            .await;
        assert!(matches!(result, Err(AgentError::ModelApi(_))));
    }
}
