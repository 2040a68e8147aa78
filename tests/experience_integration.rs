//! Integration tests for the persona evolution loop
//!
//! Exercises the full training step against temp-dir stores and
//! in-memory engagement/critic fakes, without any network access.

use async_trait::async_trait;
use chrono::Utc;
use moltbuddy::errors::{AgentError, Result};
use moltbuddy::experience::{
    resolve_persona, ActionEvent, ActionLog, CriticModel, EngagementProvider, EngagementSnapshot,
    Metric, PersonaHistory, PersonaRevision, PersonaUpdater, UpdatePhase, NO_ACTIONS_SUMMARY,
};
use serde_json::{json, Map};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

struct StaticProvider {
    snapshot: EngagementSnapshot,
    calls: AtomicUsize,
}

impl StaticProvider {
    fn new(snapshot: EngagementSnapshot) -> Arc<Self> {
        Arc::new(Self {
            snapshot,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EngagementProvider for StaticProvider {
    async fn fetch(&self, _credential: &str) -> Result<EngagementSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.clone())
    }
}

/// Critic fake that records every prompt it sees
struct RecordingModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl RecordingModel {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CriticModel for RecordingModel {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

fn spec_snapshot() -> EngagementSnapshot {
    EngagementSnapshot {
        karma: 10.0,
        follower_count: 2,
        following_count: 1,
        upvotes_received: 5.0,
        replies_received: 3.0,
        posts_count: 4,
    }
}

fn stores(dir: &TempDir) -> (ActionLog, PersonaHistory) {
    (
        ActionLog::new(dir.path().join("action_log.jsonl"), true),
        PersonaHistory::new(dir.path().join("persona_history.jsonl")),
    )
}

fn updater(
    provider: Arc<StaticProvider>,
    model: Arc<RecordingModel>,
    log: ActionLog,
    history: PersonaHistory,
    seed: Option<&str>,
) -> PersonaUpdater {
    PersonaUpdater::new(
        provider,
        model,
        log,
        history,
        Some("moltbook_sk_test".to_string()),
        "engagement",
        seed.map(str::to_string),
    )
}

#[tokio::test]
async fn test_full_step_appends_revision_with_metric_value() {
    let dir = TempDir::new().unwrap();
    let (log, history) = stores(&dir);
    let provider = StaticProvider::new(spec_snapshot());
    let model = RecordingModel::new("A wittier crab that asks follow-up questions.");

    let mut updater = updater(
        provider,
        model,
        log,
        history.clone(),
        Some("seed persona"),
    );
    let outcome = updater.run_step().await.unwrap();

    assert_eq!(updater.phase(), UpdatePhase::Done);
    assert_eq!(outcome.metric, Metric::Engagement);
    assert_eq!(outcome.metric_value, 8.0);

    let all = history.load_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].persona, "A wittier crab that asks follow-up questions.");
    assert_eq!(all[0].metric_name, Metric::Engagement);
    assert_eq!(all[0].metric_value, 8.0);
    assert!(all[0].critic_notes.contains("engagement=8"));

    // The next session resolves the revised persona.
    assert_eq!(
        resolve_persona(&history, Some("seed persona")).as_deref(),
        Some("A wittier crab that asks follow-up questions.")
    );
}

#[tokio::test]
async fn test_empty_action_log_summary_is_sentinel() {
    let dir = TempDir::new().unwrap();
    let (log, history) = stores(&dir);
    let model = RecordingModel::new("revised");

    let mut updater = updater(
        StaticProvider::new(spec_snapshot()),
        model.clone(),
        log,
        history,
        Some("seed persona"),
    );
    updater.run_step().await.unwrap();

    assert!(model.last_prompt().contains(NO_ACTIONS_SUMMARY));
}

#[tokio::test]
async fn test_logged_actions_appear_in_critic_prompt() {
    let dir = TempDir::new().unwrap();
    let (log, history) = stores(&dir);

    let mut details = Map::new();
    details.insert("submolt".to_string(), json!("general"));
    details.insert("title".to_string(), json!("Hello Moltbook"));
    log.append("create_post", details).unwrap();
    log.append("upvote_post", Map::new()).unwrap();

    let model = RecordingModel::new("revised");
    let mut updater = updater(
        StaticProvider::new(spec_snapshot()),
        model.clone(),
        log,
        history,
        Some("seed persona"),
    );
    updater.run_step().await.unwrap();

    let prompt = model.last_prompt();
    assert!(prompt.contains("- create_post:"));
    assert!(prompt.contains("Hello Moltbook"));
    assert!(prompt.contains("- upvote_post:"));
    assert!(!prompt.contains(NO_ACTIONS_SUMMARY));
    // The current persona is embedded verbatim.
    assert!(prompt.contains("seed persona"));
}

#[tokio::test]
async fn test_critic_fallback_scenario() {
    // Critic backend returns an empty string: the appended revision keeps
    // the current persona, carries the metric value, and the history
    // grows by exactly one.
    let dir = TempDir::new().unwrap();
    let (log, history) = stores(&dir);
    let model = RecordingModel::new("");

    let before = history.load_all().unwrap().len();
    let mut updater = updater(
        StaticProvider::new(spec_snapshot()),
        model,
        log,
        history.clone(),
        Some("seed persona"),
    );
    let outcome = updater.run_step().await.unwrap();

    let all = history.load_all().unwrap();
    assert_eq!(all.len(), before + 1);
    assert_eq!(outcome.revision.persona, "seed persona");
    assert_eq!(outcome.metric_value, 8.0);
    assert_eq!(all.last().unwrap().persona, "seed persona");
}

#[tokio::test]
async fn test_fatal_precondition_makes_no_external_calls() {
    // Empty history and no seed persona: the step fails while still
    // idle, with zero provider and zero critic invocations.
    let dir = TempDir::new().unwrap();
    let (log, history) = stores(&dir);
    let provider = StaticProvider::new(spec_snapshot());
    let model = RecordingModel::new("unused");

    let mut updater = updater(provider.clone(), model.clone(), log, history.clone(), None);
    let result = updater.run_step().await;

    assert!(matches!(result, Err(AgentError::MissingPrecondition(_))));
    assert_eq!(updater.phase(), UpdatePhase::Failed);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    assert!(history.load_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_successive_steps_accumulate_history() {
    let dir = TempDir::new().unwrap();
    let (log, history) = stores(&dir);

    for (i, reply) in ["persona A", "persona B", "persona C"].into_iter().enumerate() {
        let model = RecordingModel::new(reply);
        let mut updater = updater(
            StaticProvider::new(spec_snapshot()),
            model,
            log.clone(),
            history.clone(),
            Some("seed persona"),
        );
        let outcome = updater.run_step().await.unwrap();
        assert_eq!(history.load_all().unwrap().len(), i + 1);
        assert_eq!(outcome.revision.persona, reply);
    }

    // current() is the last appended revision; earlier ones are intact.
    assert_eq!(history.current().as_deref(), Some("persona C"));
    let all = history.load_all().unwrap();
    assert_eq!(all[0].persona, "persona A");
    assert_eq!(all[1].persona, "persona B");
}

#[test]
fn test_action_log_survives_interspersed_garbage() {
    use std::io::Write;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("action_log.jsonl");
    let log = ActionLog::new(path.clone(), true);

    let valid = |action_type: &str| ActionEvent {
        timestamp: Utc::now(),
        action_type: action_type.to_string(),
        details: Map::new(),
    };

    log.append_event(&valid("create_post")).unwrap();
    {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        writeln!(file, "{{\"broken\":").unwrap();
        writeln!(file, "\"just a string\"").unwrap();
    }
    log.append_event(&valid("create_comment")).unwrap();
    log.append_event(&valid("upvote_post")).unwrap();

    let events = log.load().unwrap();
    let kinds: Vec<&str> = events.iter().map(|e| e.action_type.as_str()).collect();
    assert_eq!(kinds, ["create_post", "create_comment", "upvote_post"]);
}

#[test]
fn test_revision_round_trip_field_for_field() {
    let dir = TempDir::new().unwrap();
    let history = PersonaHistory::new(dir.path().join("persona_history.jsonl"));

    let revision = PersonaRevision {
        timestamp: Utc::now(),
        persona: "A careful reader who cites sources.".to_string(),
        metric_name: Metric::RepliesReceived,
        metric_value: 3.0,
        critic_notes: "Metric: replies_received=3; critic proposed update.".to_string(),
    };
    history.append(&revision).unwrap();

    let all = history.load_all().unwrap();
    assert_eq!(all.last().unwrap(), &revision);
}
