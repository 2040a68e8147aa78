//! Engagement metrics
//!
//! A metric is a named scalar reward computed from an engagement
//! snapshot; it is what the persona update loop tries to maximize.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current platform statistics for the agent's account.
///
/// Produced fresh by the engagement provider on every update step and
/// never persisted. Missing numeric fields default to zero so metric
/// formulas are total over any syntactically valid snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    #[serde(default)]
    pub karma: f64,

    #[serde(default)]
    pub follower_count: u64,

    #[serde(default)]
    pub following_count: u64,

    /// Total upvotes across recent posts
    #[serde(default)]
    pub upvotes_received: f64,

    /// Total comments across recent posts
    #[serde(default)]
    pub replies_received: f64,

    #[serde(default)]
    pub posts_count: u64,
}

/// The closed set of metrics the critic can maximize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Moltbook karma from the profile
    Karma,
    /// Current follower count
    FollowerCount,
    /// Total upvotes on recent posts
    UpvotesReceived,
    /// Total comments on recent posts
    RepliesReceived,
    /// upvotes_received + replies_received
    Engagement,
}

/// Metric used when none (or an unrecognized one) is configured
pub const DEFAULT_METRIC: Metric = Metric::Engagement;

impl Metric {
    /// All metric options, in documentation order
    pub const ALL: [Metric; 5] = [
        Metric::UpvotesReceived,
        Metric::RepliesReceived,
        Metric::FollowerCount,
        Metric::Karma,
        Metric::Engagement,
    ];

    /// Parse a configured metric name. Returns None for names outside
    /// the enumerated set; callers decide how to fall back.
    pub fn parse(name: &str) -> Option<Metric> {
        match name.trim().to_lowercase().as_str() {
            "karma" => Some(Metric::Karma),
            "follower_count" => Some(Metric::FollowerCount),
            "upvotes_received" => Some(Metric::UpvotesReceived),
            "replies_received" => Some(Metric::RepliesReceived),
            "engagement" => Some(Metric::Engagement),
            _ => None,
        }
    }

    /// Wire/display name of the metric
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Karma => "karma",
            Metric::FollowerCount => "follower_count",
            Metric::UpvotesReceived => "upvotes_received",
            Metric::RepliesReceived => "replies_received",
            Metric::Engagement => "engagement",
        }
    }

    /// Compute this metric over a snapshot. Pure and total: never errors.
    pub fn compute(&self, snapshot: &EngagementSnapshot) -> f64 {
        match self {
            Metric::Karma => snapshot.karma,
            Metric::FollowerCount => snapshot.follower_count as f64,
            Metric::UpvotesReceived => snapshot.upvotes_received,
            Metric::RepliesReceived => snapshot.replies_received,
            Metric::Engagement => snapshot.upvotes_received + snapshot.replies_received,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute the metric named `metric_name` over a snapshot.
///
/// Names outside the enumerated set use the `engagement` formula.
pub fn compute_metric(snapshot: &EngagementSnapshot, metric_name: &str) -> f64 {
    Metric::parse(metric_name)
        .unwrap_or(DEFAULT_METRIC)
        .compute(snapshot)
}
