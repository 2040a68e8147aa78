//! Moltbook tool dispatch
//!
//! Maps the agent's tool calls onto the Moltbook client. Side-effecting
//! tools (posting, commenting, voting, following) record an ActionEvent
//! in the action log; read-only tools (browsing, searching, profile
//! lookups) do not.

use crate::errors::Result;
use crate::experience::action_log::ActionLog;
use crate::moltbook::client::MoltbookClient;
use serde_json::{json, Map, Value};

/// Tool descriptions injected into the system prompt
pub const TOOL_CATALOG: &[&str] = &[
    "check_status: Check if the agent is claimed and get status. Args: none",
    "get_profile: Get an agent profile (your own when agent_name is omitted). Args: agent_name (string, optional)",
    "get_feed: Get the personalized feed or a submolt's posts. Args: sort (string, optional: 'hot', 'new', 'top', 'rising', default 'hot'), limit (number, optional, default 25), submolt (string, optional)",
    "create_post: Create a post. Args: submolt (string, required), title (string, required), content (string, optional for text posts), url (string, optional for link posts)",
    "get_post: Get a single post by ID. Args: post_id (string, required)",
    "create_comment: Comment on a post. Args: post_id (string, required), content (string, required), parent_id (string, optional for replies)",
    "get_comments: Get comments on a post. Args: post_id (string, required), sort (string, optional: 'top', 'new', 'controversial', default 'top')",
    "upvote_post: Upvote a post. Args: post_id (string, required)",
    "downvote_post: Downvote a post. Args: post_id (string, required)",
    "upvote_comment: Upvote a comment. Args: comment_id (string, required)",
    "list_submolts: List all submolts (communities). Args: none",
    "get_submolt: Get information about a submolt. Args: name (string, required)",
    "create_submolt: Create a submolt. Args: name (string, required), display_name (string, required), description (string, required)",
    "subscribe_submolt: Subscribe to a submolt. Args: name (string, required)",
    "follow_agent: Follow another agent. Args: agent_name (string, required)",
    "search_moltbook: Semantic search over posts and comments. Args: query (string, required), type (string, optional: 'posts', 'comments', 'all', default 'all'), limit (number, optional, default 20)",
    "update_profile: Update your own profile. Args: description (string, optional), metadata (object, optional)",
];

/// Execute one tool call against the Moltbook API.
///
/// Unknown tools produce a structured error value rather than failing
/// the session; storage failures while logging an action do propagate.
pub async fn execute_tool(
    client: &MoltbookClient,
    log: &ActionLog,
    name: &str,
    args: &Value,
) -> Result<Value> {
    match name {
        "check_status" => client.agent_status().await,

        "get_profile" => client.agent_profile(arg_str(args, "agent_name")).await,

        "get_feed" => {
            let sort = arg_str(args, "sort").unwrap_or("hot");
            let limit = arg_u64(args, "limit").unwrap_or(25) as u32;
            match arg_str(args, "submolt") {
                Some(submolt) => client.posts(sort, limit, Some(submolt)).await,
                None => client.feed(sort, limit, None).await,
            }
        }

        "create_post" => {
            let submolt = require_str(args, "submolt")?;
            let title = require_str(args, "title")?;
            let content = arg_str(args, "content");
            let url = arg_str(args, "url");
            let out = client.create_post(submolt, title, content, url).await?;
            log.append(
                "create_post",
                details(&[
                    ("submolt", json!(submolt)),
                    ("title", json!(title)),
                    ("content", json!(truncate(content.unwrap_or(""), 200))),
                    ("url", json!(url)),
                ]),
            )?;
            Ok(out)
        }

        "get_post" => client.post(require_str(args, "post_id")?).await,

        "create_comment" => {
            let post_id = require_str(args, "post_id")?;
            let content = require_str(args, "content")?;
            let parent_id = arg_str(args, "parent_id");
            let out = client.create_comment(post_id, content, parent_id).await?;
            log.append(
                "create_comment",
                details(&[
                    ("post_id", json!(post_id)),
                    ("content", json!(truncate(content, 200))),
                    ("parent_id", json!(parent_id)),
                ]),
            )?;
            Ok(out)
        }

        "get_comments" => {
            let post_id = require_str(args, "post_id")?;
            let sort = arg_str(args, "sort").unwrap_or("top");
            client.comments(post_id, sort).await
        }

        "upvote_post" => {
            let post_id = require_str(args, "post_id")?;
            let out = client.upvote_post(post_id).await?;
            log.append("upvote_post", details(&[("post_id", json!(post_id))]))?;
            Ok(out)
        }

        "downvote_post" => {
            let post_id = require_str(args, "post_id")?;
            let out = client.downvote_post(post_id).await?;
            log.append("downvote_post", details(&[("post_id", json!(post_id))]))?;
            Ok(out)
        }

        "upvote_comment" => {
            let comment_id = require_str(args, "comment_id")?;
            let out = client.upvote_comment(comment_id).await?;
            log.append(
                "upvote_comment",
                details(&[("comment_id", json!(comment_id))]),
            )?;
            Ok(out)
        }

        "list_submolts" => client.list_submolts().await,

        "get_submolt" => client.submolt(require_str(args, "name")?).await,

        "create_submolt" => {
            client
                .create_submolt(
                    require_str(args, "name")?,
                    require_str(args, "display_name")?,
                    require_str(args, "description")?,
                )
                .await
        }

        "subscribe_submolt" => client.subscribe_submolt(require_str(args, "name")?).await,

        "follow_agent" => {
            let agent_name = require_str(args, "agent_name")?;
            let out = client.follow_agent(agent_name).await?;
            log.append(
                "follow_agent",
                details(&[("agent_name", json!(agent_name))]),
            )?;
            Ok(out)
        }

        "search_moltbook" => {
            let query = require_str(args, "query")?;
            let kind = arg_str(args, "type").unwrap_or("all");
            let limit = arg_u64(args, "limit").unwrap_or(20) as u32;
            client.search(query, kind, limit).await
        }

        "update_profile" => {
            client
                .update_profile(arg_str(args, "description"), args.get("metadata").cloned())
                .await
        }

        other => Ok(json!({
            "success": false,
            "error": "unknown_tool",
            "message": format!("Unknown tool: {}", other),
        })),
    }
}

fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn arg_u64(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    arg_str(args, key).ok_or_else(|| {
        crate::errors::AgentError::ModelApi(format!("Tool call missing required arg '{}'", key))
    })
}

fn details(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in pairs {
        map.insert(key.to_string(), value.clone());
    }
    map
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
