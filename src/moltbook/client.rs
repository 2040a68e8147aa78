//! Moltbook API client
//!
//! Thin HTTP client over the Moltbook REST API. HTTP status errors are
//! converted into structured JSON values (`success: false`, `error`,
//! `message`, `hint`) so the agent loop can react to them instead of
//! crashing; transport failures still surface as errors.

use crate::errors::{AgentError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Production API base URL
pub const DEFAULT_BASE_URL: &str = "https://www.moltbook.com/api/v1";

/// Request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Moltbook API
#[derive(Debug, Clone)]
pub struct MoltbookClient {
    client: Client,
    base_url: String,
}

impl MoltbookClient {
    /// Create a client against the production API
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a client against a custom base URL (testing)
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| AgentError::Config("API key contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the agent is claimed and get status
    pub async fn agent_status(&self) -> Result<Value> {
        self.request(Method::GET, "/agents/status", &[], None).await
    }

    /// Get an agent profile. `None` returns your own profile.
    pub async fn agent_profile(&self, name: Option<&str>) -> Result<Value> {
        match name {
            Some(name) => {
                self.request(
                    Method::GET,
                    "/agents/profile",
                    &[("name", name.to_string())],
                    None,
                )
                .await
            }
            None => self.request(Method::GET, "/agents/me", &[], None).await,
        }
    }

    /// Create a new post (text when `content`, link when `url`)
    pub async fn create_post(
        &self,
        submolt: &str,
        title: &str,
        content: Option<&str>,
        url: Option<&str>,
    ) -> Result<Value> {
        let mut data = Map::new();
        data.insert("submolt".to_string(), json!(submolt));
        data.insert("title".to_string(), json!(title));
        if let Some(content) = content {
            data.insert("content".to_string(), json!(content));
        }
        if let Some(url) = url {
            data.insert("url".to_string(), json!(url));
        }
        self.request(Method::POST, "/posts", &[], Some(Value::Object(data)))
            .await
    }

    /// Get the personalized feed
    pub async fn feed(&self, sort: &str, limit: u32, submolt: Option<&str>) -> Result<Value> {
        let mut query = vec![
            ("sort", sort.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(submolt) = submolt {
            query.push(("submolt", submolt.to_string()));
        }
        self.request(Method::GET, "/feed", &query, None).await
    }

    /// Get posts, optionally filtered by submolt
    pub async fn posts(&self, sort: &str, limit: u32, submolt: Option<&str>) -> Result<Value> {
        let mut query = vec![
            ("sort", sort.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(submolt) = submolt {
            query.push(("submolt", submolt.to_string()));
        }
        self.request(Method::GET, "/posts", &query, None).await
    }

    /// Get a single post by ID
    pub async fn post(&self, post_id: &str) -> Result<Value> {
        self.request(Method::GET, &format!("/posts/{}", post_id), &[], None)
            .await
    }

    /// Delete your own post
    pub async fn delete_post(&self, post_id: &str) -> Result<Value> {
        self.request(Method::DELETE, &format!("/posts/{}", post_id), &[], None)
            .await
    }

    /// Add a comment to a post, optionally as a reply
    pub async fn create_comment(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<Value> {
        let mut data = Map::new();
        data.insert("content".to_string(), json!(content));
        if let Some(parent_id) = parent_id {
            data.insert("parent_id".to_string(), json!(parent_id));
        }
        self.request(
            Method::POST,
            &format!("/posts/{}/comments", post_id),
            &[],
            Some(Value::Object(data)),
        )
        .await
    }

    /// Get comments on a post
    pub async fn comments(&self, post_id: &str, sort: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/posts/{}/comments", post_id),
            &[("sort", sort.to_string())],
            None,
        )
        .await
    }

    pub async fn upvote_post(&self, post_id: &str) -> Result<Value> {
        self.request(Method::POST, &format!("/posts/{}/upvote", post_id), &[], None)
            .await
    }

    pub async fn downvote_post(&self, post_id: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/posts/{}/downvote", post_id),
            &[],
            None,
        )
        .await
    }

    pub async fn upvote_comment(&self, comment_id: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/comments/{}/upvote", comment_id),
            &[],
            None,
        )
        .await
    }

    /// Create a new submolt (community)
    pub async fn create_submolt(
        &self,
        name: &str,
        display_name: &str,
        description: &str,
    ) -> Result<Value> {
        let data = json!({
            "name": name,
            "display_name": display_name,
            "description": description,
        });
        self.request(Method::POST, "/submolts", &[], Some(data)).await
    }

    pub async fn list_submolts(&self) -> Result<Value> {
        self.request(Method::GET, "/submolts", &[], None).await
    }

    pub async fn submolt(&self, name: &str) -> Result<Value> {
        self.request(Method::GET, &format!("/submolts/{}", name), &[], None)
            .await
    }

    pub async fn subscribe_submolt(&self, name: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/submolts/{}/subscribe", name),
            &[],
            None,
        )
        .await
    }

    pub async fn unsubscribe_submolt(&self, name: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("/submolts/{}/subscribe", name),
            &[],
            None,
        )
        .await
    }

    pub async fn follow_agent(&self, agent_name: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/agents/{}/follow", agent_name),
            &[],
            None,
        )
        .await
    }

    pub async fn unfollow_agent(&self, agent_name: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("/agents/{}/follow", agent_name),
            &[],
            None,
        )
        .await
    }

    /// Semantic search over posts and comments
    pub async fn search(&self, query: &str, kind: &str, limit: u32) -> Result<Value> {
        self.request(
            Method::GET,
            "/search",
            &[
                ("q", query.to_string()),
                ("type", kind.to_string()),
                ("limit", limit.to_string()),
            ],
            None,
        )
        .await
    }

    /// Update your own profile
    pub async fn update_profile(
        &self,
        description: Option<&str>,
        metadata: Option<Value>,
    ) -> Result<Value> {
        let mut data = Map::new();
        if let Some(description) = description {
            data.insert("description".to_string(), json!(description));
        }
        if let Some(metadata) = metadata {
            data.insert("metadata".to_string(), metadata);
        }
        self.request(Method::PATCH, "/agents/me", &[], Some(Value::Object(data)))
            .await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        Self::into_value(response).await
    }

    /// Convert a response into a JSON value. Success with an empty body
    /// becomes `{"success": true}`; error statuses become structured
    /// error values the agent can reason about.
    async fn into_value(response: Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(json!({"success": true}));
            }
            return Ok(serde_json::from_str(&text).unwrap_or(json!({"success": true})));
        }

        let body: Value = serde_json::from_str(&text).unwrap_or(json!({}));
        Ok(Self::api_error_value(status, &body, &text))
    }

    fn api_error_value(status: StatusCode, body: &Value, raw: &str) -> Value {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return json!({
                "success": false,
                "error": "rate_limit",
                "message": Self::rate_limit_message(body),
                "hint": "Try upvoting, browsing, or searching instead of posting/commenting until the cooldown passes.",
            });
        }

        let error = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("api_error");
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}: {}", status, raw.trim()));
        let hint = body.get("hint").and_then(Value::as_str).unwrap_or("");

        json!({
            "success": false,
            "error": error,
            "message": message,
            "hint": hint,
        })
    }

    /// Friendly 429 message quoting the platform cooldowns
    /// (1 post/30 min, 1 comment/20 s, 100 req/min).
    fn rate_limit_message(body: &Value) -> String {
        let mut message = "Rate limited by Moltbook.".to_string();
        if let Some(minutes) = body.get("retry_after_minutes").and_then(Value::as_i64) {
            message.push_str(&format!(
                " You can post again in {} minutes (1 post per 30 min).",
                minutes
            ));
        } else if let Some(seconds) = body.get("retry_after_seconds").and_then(Value::as_i64) {
            message.push_str(&format!(
                " You can comment again in {} seconds (1 comment per 20 sec).",
                seconds
            ));
        } else {
            message.push_str(" Wait about a minute and try again (100 requests/min limit).");
        }
        message
    }
}
