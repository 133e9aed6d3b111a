//! Steps, outcomes, and the journal that reports them.
//!
//! The [`Journal`] is the pipeline's logging side channel: every step start
//! and completion goes to `tracing` and to the caller's event callback, and
//! is kept so the final [`RunOutcome`](super::RunOutcome) can list what
//! happened.

use std::fmt;

use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Steps of the bump/release pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// `git status`
    Status,
    /// Check out the source branch.
    Checkout,
    /// `git pull`
    Pull,
    /// Find the current version.
    Resolve,
    /// Compute the next version.
    Bump,
    /// Write the plain version file.
    WriteVersionFile,
    /// Rewrite the manifest's `version` field.
    WriteManifest,
    /// `git add` a written file.
    Stage,
    /// Commit staged changes.
    Commit,
    /// Tag HEAD with the new version.
    Tag,
    /// Push the commit.
    PushCommit,
    /// Create the release-candidate branch.
    CreateBranch,
    /// Push the release-candidate branch.
    PushBranch,
    /// Push tags.
    PushTags,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Status => "status",
            Self::Checkout => "checkout",
            Self::Pull => "pull",
            Self::Resolve => "resolve",
            Self::Bump => "bump",
            Self::WriteVersionFile => "write version file",
            Self::WriteManifest => "write manifest",
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::Tag => "tag",
            Self::PushCommit => "push commit",
            Self::CreateBranch => "create branch",
            Self::PushBranch => "push branch",
            Self::PushTags => "push tags",
        };
        f.write_str(name)
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StepOutcome {
    /// Step completed.
    Success {
        /// What happened.
        message: String,
    },
    /// Step intentionally not run.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
    /// Step failed; the pipeline continued without its effect.
    Failed {
        /// The error, rendered.
        error: String,
    },
}

impl StepOutcome {
    /// Whether this outcome is a failure.
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Events emitted while the pipeline runs, for progress display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A step has started.
    StepStarted(Step),
    /// A step has finished.
    StepCompleted(Step, StepOutcome),
}

/// Records step outcomes and forwards them to an event callback.
pub struct Journal<'a> {
    steps: Vec<(Step, StepOutcome)>,
    sink: Box<dyn FnMut(&PipelineEvent) + 'a>,
}

impl<'a> Journal<'a> {
    /// Create a journal that forwards events to `sink`.
    pub fn new(sink: impl FnMut(&PipelineEvent) + 'a) -> Self {
        Self {
            steps: Vec::new(),
            sink: Box::new(sink),
        }
    }

    /// A journal with no event callback.
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    /// Announce that `step` is starting.
    pub fn start(&mut self, step: Step) {
        debug!(%step, "step started");
        (self.sink)(&PipelineEvent::StepStarted(step));
    }

    /// Record a successful step.
    pub fn succeed(&mut self, step: Step, message: impl Into<String>) {
        let message = message.into();
        debug!(%step, %message, "step succeeded");
        self.record(step, StepOutcome::Success { message });
    }

    /// Record an intentionally skipped step.
    pub fn skip(&mut self, step: Step, reason: impl Into<String>) {
        let reason = reason.into();
        info!(%step, %reason, "step skipped");
        self.record(step, StepOutcome::Skipped { reason });
    }

    /// Record a failed step. The caller continues with its prior state.
    pub fn fail(&mut self, step: Step, error: &dyn fmt::Display) {
        let error = error.to_string();
        warn!(%step, %error, "step failed, continuing");
        self.record(step, StepOutcome::Failed { error });
    }

    /// Record a failed step that ends the run.
    pub fn abort(&mut self, step: Step, error: &dyn fmt::Display) {
        let error = error.to_string();
        error!(%step, %error, "step failed, stopping run");
        self.record(step, StepOutcome::Failed { error });
    }

    /// Outcomes recorded so far, in order.
    pub fn steps(&self) -> &[(Step, StepOutcome)] {
        &self.steps
    }

    /// Outcome of the most recent run of `step`, if any.
    pub fn last(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .rev()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| outcome)
    }

    /// Consume the journal, returning the recorded outcomes.
    pub fn into_steps(self) -> Vec<(Step, StepOutcome)> {
        self.steps
    }

    fn record(&mut self, step: Step, outcome: StepOutcome) {
        (self.sink)(&PipelineEvent::StepCompleted(step, outcome.clone()));
        self.steps.push((step, outcome));
    }
}

impl fmt::Debug for Journal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journal")
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}
