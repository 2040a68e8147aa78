//! Update orchestrator
//!
//! One training step: fetch engagement, compute the metric, summarize
//! recent actions, resolve the current persona, run the critic, append
//! the new revision. The step is a linear phase machine; `Failed` is
//! reachable from every phase, and the history append at the end is the
//! step's only durable side effect. Re-running after success only ever
//! appends, so repetition is safe.

use crate::errors::{AgentError, Result};
use crate::experience::action_log::ActionLog;
use crate::experience::critic::{summarize_actions, Critic, CriticModel};
use crate::experience::history::{PersonaHistory, PersonaRevision};
use crate::experience::metrics::{EngagementSnapshot, Metric, DEFAULT_METRIC};
use crate::experience::resolver::resolve_persona;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// External source of current platform statistics.
///
/// Produces a fresh snapshot per call; results are never cached.
#[async_trait]
pub trait EngagementProvider: Send + Sync {
    async fn fetch(&self, credential: &str) -> Result<EngagementSnapshot>;
}

/// Phases of one training step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdatePhase {
    Idle,
    FetchingEngagement,
    ComputingMetric,
    SummarizingActions,
    ResolvingPersona,
    InvokingCritic,
    AppendingRevision,
    /// Step completed; the revision is durable (terminal)
    Done,
    /// Step aborted; nothing was appended unless `Done` was reached (terminal)
    Failed,
}

impl UpdatePhase {
    /// Check if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpdatePhase::Done | UpdatePhase::Failed)
    }

    /// Successor phase in the linear step pipeline.
    ///
    /// Valid transitions:
    /// ```text
    /// 1. Idle               → FetchingEngagement
    /// 2. FetchingEngagement → ComputingMetric
    /// 3. ComputingMetric    → SummarizingActions
    /// 4. SummarizingActions → ResolvingPersona
    /// 5. ResolvingPersona   → InvokingCritic
    /// 6. InvokingCritic     → AppendingRevision
    /// 7. AppendingRevision  → Done
    /// 8. *                  → Failed (on any error)
    /// ```
    pub fn advance(&self) -> Result<UpdatePhase> {
        use UpdatePhase::*;

        let next = match self {
            Idle => FetchingEngagement,
            FetchingEngagement => ComputingMetric,
            ComputingMetric => SummarizingActions,
            SummarizingActions => ResolvingPersona,
            ResolvingPersona => InvokingCritic,
            InvokingCritic => AppendingRevision,
            AppendingRevision => Done,
            Done | Failed => {
                return Err(AgentError::InvalidTransition {
                    from: format!("{:?}", self),
                    to: "next".to_string(),
                    reason: "terminal phase".to_string(),
                });
            }
        };

        Ok(next)
    }
}

/// Result of a successful training step
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The snapshot the metric was computed from
    pub snapshot: EngagementSnapshot,

    /// Metric that was maximized
    pub metric: Metric,

    /// Its value at fetch time
    pub metric_value: f64,

    /// Persona the critic started from
    pub previous_persona: String,

    /// The appended revision
    pub revision: PersonaRevision,
}

/// Composes the experience components into discrete training steps
pub struct PersonaUpdater {
    provider: Arc<dyn EngagementProvider>,
    critic: Critic,
    action_log: ActionLog,
    history: PersonaHistory,
    credential: Option<String>,
    metric: Metric,
    seed_persona: Option<String>,
    verbose: bool,
    phase: UpdatePhase,
}

impl PersonaUpdater {
    /// Create an updater. An unrecognized `metric_name` is treated as
    /// the default metric with a warning, not a failure.
    pub fn new(
        provider: Arc<dyn EngagementProvider>,
        critic_model: Arc<dyn CriticModel>,
        action_log: ActionLog,
        history: PersonaHistory,
        credential: Option<String>,
        metric_name: &str,
        seed_persona: Option<String>,
    ) -> Self {
        let metric = Metric::parse(metric_name).unwrap_or_else(|| {
            eprintln!(
                "Warning: unknown metric '{}'; using '{}'",
                metric_name,
                DEFAULT_METRIC.name()
            );
            DEFAULT_METRIC
        });

        Self {
            provider,
            critic: Critic::new(critic_model),
            action_log,
            history,
            credential,
            metric,
            seed_persona,
            verbose: false,
            phase: UpdatePhase::Idle,
        }
    }

    /// Enable per-phase transition logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Current phase (Idle before the first step)
    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    /// Metric this updater maximizes
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Run one full training step.
    ///
    /// Preconditions (credential present, persona resolvable) are
    /// checked before any external call; their absence fails the step
    /// with zero provider or critic invocations. A failure at any later
    /// phase aborts the step with nothing appended; the history append
    /// at the end happens exactly once per successful step.
    pub async fn run_step(&mut self) -> Result<UpdateOutcome> {
        self.phase = UpdatePhase::Idle;

        match self.step_inner().await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.phase = UpdatePhase::Failed;
                Err(err)
            }
        }
    }

    async fn step_inner(&mut self) -> Result<UpdateOutcome> {
        // Preconditions, checked while still Idle: no external call is
        // made when the step cannot possibly complete.
        let credential = self
            .credential
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                AgentError::MissingPrecondition("Moltbook API key not configured".to_string())
            })?;

        if resolve_persona(&self.history, self.seed_persona.as_deref()).is_none() {
            return Err(AgentError::MissingPrecondition(
                "no current persona: history is empty and no seed persona is configured"
                    .to_string(),
            ));
        }

        self.transition(UpdatePhase::FetchingEngagement)?;
        let snapshot = self.provider.fetch(&credential).await?;

        self.transition(UpdatePhase::ComputingMetric)?;
        let metric_value = self.metric.compute(&snapshot);

        self.transition(UpdatePhase::SummarizingActions)?;
        let actions = self.action_log.load()?;
        let action_summary = summarize_actions(&actions);

        self.transition(UpdatePhase::ResolvingPersona)?;
        let current_persona = resolve_persona(&self.history, self.seed_persona.as_deref())
            .ok_or_else(|| {
                AgentError::MissingPrecondition("current persona disappeared mid-step".to_string())
            })?;

        self.transition(UpdatePhase::InvokingCritic)?;
        let (new_persona, critic_notes) = self
            .critic
            .propose(
                &current_persona,
                &snapshot,
                self.metric,
                metric_value,
                &action_summary,
            )
            .await?;

        self.transition(UpdatePhase::AppendingRevision)?;
        let revision = PersonaRevision {
            timestamp: Utc::now(),
            persona: new_persona,
            metric_name: self.metric,
            metric_value,
            critic_notes,
        };
        self.history.append(&revision)?;

        self.transition(UpdatePhase::Done)?;

        Ok(UpdateOutcome {
            snapshot,
            metric: self.metric,
            metric_value,
            previous_persona: current_persona,
            revision,
        })
    }

    /// Validated transition to the next phase
    fn transition(&mut self, to: UpdatePhase) -> Result<()> {
        let expected = self.phase.advance()?;
        if expected != to {
            return Err(AgentError::InvalidTransition {
                from: format!("{:?}", self.phase),
                to: format!("{:?}", to),
                reason: format!("expected {:?}", expected),
            });
        }

        if self.verbose {
            eprintln!("[PHASE] {:?} -> {:?}", self.phase, to);
        }

        self.phase = to;
        Ok(())
    }
}

/// Number of actions logged after the most recent persona revision.
///
/// Advisory only: the cadence threshold never auto-triggers a step, the
/// CLI just surfaces it as a hint.
pub fn actions_since_last_revision(
    action_log: &ActionLog,
    history: &PersonaHistory,
) -> Result<usize> {
    let actions = action_log.load()?;
    let last_revision = history.load_all()?.last().map(|r| r.timestamp);

    Ok(match last_revision {
        Some(since) => actions.iter().filter(|a| a.timestamp > since).count(),
        None => actions.len(),
    })
}

/// Whether the advisory cadence threshold has been reached. A zero
/// threshold disables the hint.
pub fn update_due(
    action_log: &ActionLog,
    history: &PersonaHistory,
    threshold: usize,
) -> Result<bool> {
    if threshold == 0 {
        return Ok(false);
    }
    Ok(actions_since_last_revision(action_log, history)? >= threshold)
}
