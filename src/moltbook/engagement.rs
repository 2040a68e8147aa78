//! Engagement provider
//!
//! Derives a fresh `EngagementSnapshot` from the agent's Moltbook
//! profile: karma and follower counts from the agent object, upvotes
//! and replies summed over recent posts. Tolerates the wrapper shapes
//! the API is known to return; missing fields default to zero.

use crate::errors::{AgentError, Result};
use crate::experience::metrics::EngagementSnapshot;
use crate::experience::updater::EngagementProvider;
use crate::moltbook::client::MoltbookClient;
use async_trait::async_trait;
use serde_json::Value;

/// Engagement provider backed by the Moltbook API
#[derive(Debug, Clone)]
pub struct MoltbookEngagement {
    base_url: String,
}

impl MoltbookEngagement {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl EngagementProvider for MoltbookEngagement {
    async fn fetch(&self, credential: &str) -> Result<EngagementSnapshot> {
        let client = MoltbookClient::with_base_url(&self.base_url, credential)?;
        let profile = client.agent_profile(None).await?;

        // A structured API error is a provider failure, not a zeroed
        // snapshot: no partial result may reach the metric stage.
        if profile.get("success") == Some(&Value::Bool(false)) {
            let message = profile
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("profile fetch failed");
            return Err(AgentError::MoltbookApi(message.to_string()));
        }

        Ok(snapshot_from_profile(&profile))
    }
}

/// Derive a snapshot from a profile response.
///
/// Handles both `{"agent": ...}` wrappers and bare profiles, and agents
/// wrapped in a single-element list. Recent posts may carry upvotes as
/// `upvotes` or `score`, and replies as `comment_count` or a `comments`
/// array; some responses use `[id, title, upvotes, ...]` tuples.
pub fn snapshot_from_profile(profile: &Value) -> EngagementSnapshot {
    let agent = match profile.get("agent") {
        Some(Value::Array(list)) => list.first().cloned().unwrap_or(Value::Null),
        Some(agent) if !agent.is_null() => agent.clone(),
        _ => profile.clone(),
    };

    let karma = number_field(&agent, "karma");
    let follower_count = number_field(&agent, "follower_count") as u64;
    let following_count = number_field(&agent, "following_count") as u64;

    let recent_posts = agent
        .get("recentPosts")
        .or_else(|| profile.get("recentPosts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut upvotes_received = 0.0;
    let mut replies_received = 0.0;
    for post in &recent_posts {
        match post {
            Value::Object(_) => {
                // upvotes when set, score as the fallback field name
                upvotes_received += post
                    .get("upvotes")
                    .and_then(Value::as_f64)
                    .filter(|v| *v != 0.0)
                    .or_else(|| post.get("score").and_then(Value::as_f64))
                    .unwrap_or(0.0);
                let comment_count = post.get("comment_count").and_then(Value::as_f64);
                if let Some(count) = comment_count {
                    replies_received += count;
                } else if let Some(comments) = post.get("comments").and_then(Value::as_array) {
                    replies_received += comments.len() as f64;
                }
            }
            Value::Array(tuple) if tuple.len() > 2 => {
                // [id, title, upvotes, ...] tuple shape
                if let Some(upvotes) = tuple[2].as_f64() {
                    upvotes_received += upvotes;
                } else if let Some(text) = tuple[2].as_str() {
                    if let Ok(upvotes) = text.parse::<f64>() {
                        upvotes_received += upvotes;
                    }
                }
            }
            _ => {}
        }
    }

    EngagementSnapshot {
        karma,
        follower_count,
        following_count,
        upvotes_received,
        replies_received,
        posts_count: recent_posts.len() as u64,
    }
}

fn number_field(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_wrapped_profile() {
        let profile = json!({
            "agent": {
                "karma": 10,
                "follower_count": 2,
                "following_count": 1,
                "recentPosts": [
                    {"upvotes": 3, "comment_count": 2},
                    {"score": 2, "comments": [{}, {}]},
                    {"title": "no engagement yet"},
                ],
            }
        });

        let snapshot = snapshot_from_profile(&profile);
        assert_eq!(snapshot.karma, 10.0);
        assert_eq!(snapshot.follower_count, 2);
        assert_eq!(snapshot.following_count, 1);
        assert_eq!(snapshot.upvotes_received, 5.0);
        assert_eq!(snapshot.replies_received, 4.0);
        assert_eq!(snapshot.posts_count, 3);
    }

    #[test]
    fn test_snapshot_from_bare_profile() {
        let profile = json!({
            "karma": 7,
            "follower_count": 4,
            "recentPosts": [],
        });

        let snapshot = snapshot_from_profile(&profile);
        assert_eq!(snapshot.karma, 7.0);
        assert_eq!(snapshot.follower_count, 4);
        assert_eq!(snapshot.posts_count, 0);
    }

    #[test]
    fn test_snapshot_from_list_wrapped_agent() {
        let profile = json!({
            "agent": [{"karma": 3, "follower_count": 1}],
        });

        let snapshot = snapshot_from_profile(&profile);
        assert_eq!(snapshot.karma, 3.0);
        assert_eq!(snapshot.follower_count, 1);
    }

    #[test]
    fn test_snapshot_from_tuple_posts() {
        let profile = json!({
            "karma": 0,
            "recentPosts": [
                ["p1", "title", 4],
                ["p2", "title", "6"],
                ["p3"],
            ],
        });

        let snapshot = snapshot_from_profile(&profile);
        assert_eq!(snapshot.upvotes_received, 10.0);
        assert_eq!(snapshot.posts_count, 3);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let snapshot = snapshot_from_profile(&json!({}));
        assert_eq!(snapshot, EngagementSnapshot::default());
    }
}
