//! The bump/release pipeline.
//!
//! [`run`] drives one invocation from validated options to a [`RunOutcome`]:
//!
//! ```text
//! status → checkout → pull → resolve → bump → write files → commit → tag
//!        → push commit → (release) create branch → push branch → push tags
//! ```
//!
//! A run stops early only on invalid input (caught when building
//! [`RunOptions`]), no resolvable current version, a version component
//! already at its maximum, or a manifest that can't be parsed. Every other failure is recorded in the step report and
//! the run carries on with the state it had.
//!
//! Progress is reported through the `on_event` callback so the CLI can
//! drive spinners without the core knowing about terminals.

pub mod attempt;
pub mod event;
pub mod state;

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::git::Vcs;
use crate::persist::{self, PersistError};
use crate::resolve::{self, ResolveError, SourceKind};
use crate::validate::{ValidatedInput, ValidationError, validate_inputs};
use crate::version::{self, VersionError, VersionPart};

use attempt::{attempt, attempt_with};
pub use event::{Journal, PipelineEvent, Step, StepOutcome};
pub use state::PipelineState;

/// Branch checked out when none is given.
pub const DEFAULT_FROM_BRANCH: &str = "develop";

/// Appended to the version to name the release-candidate branch.
pub const DEFAULT_RC_BRANCH_SUFFIX: &str = "_Release_Candidate";

/// Skip reason for push steps when no remote is configured.
pub const NO_REMOTE: &str = "auto-push remote is not set";

/// Errors that stop a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Command input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No current version could be found.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The manifest could not be rewritten.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The next version could not be computed.
    #[error(transparent)]
    Version(#[from] VersionError),
}

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Which command is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    /// Bump the version on the source branch.
    #[default]
    Bump,
    /// Bump the version and cut a release-candidate branch.
    Release,
}

impl Workflow {
    /// Commit message for a version change to `version`.
    pub fn commit_message(self, version: &Version) -> String {
        match self {
            Self::Bump => format!("Version - Bumped version to {version}."),
            Self::Release => format!("rc-version - Repo version upgraded to {version}."),
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bump => write!(f, "bump"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// Raw command input, before validation.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Which command is running.
    pub workflow: Workflow,
    /// Branch to start from.
    pub from_branch: String,
    /// Version part keyword.
    pub semver_part: String,
    /// Explicit current version.
    pub semver: Option<String>,
    /// Plain version file, relative to the project root.
    pub semver_file: Option<String>,
    /// JSON manifest, relative to the project root.
    pub package_json: Option<String>,
    /// Remote to push to; unset disables every push.
    pub auto_push_remote: Option<String>,
    /// Release-candidate branch suffix.
    pub rc_branch_suffix: Option<String>,
    /// Repository root; git runs here and file paths are relative to it.
    pub project_root: Utf8PathBuf,
}

/// Validated, immutable options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Which command is running.
    pub workflow: Workflow,
    /// Validated branch, part, and explicit version.
    pub input: ValidatedInput,
    /// Plain version file.
    pub semver_file: Option<Utf8PathBuf>,
    /// JSON manifest.
    pub package_json: Option<Utf8PathBuf>,
    /// Remote to push to.
    pub auto_push_remote: Option<String>,
    /// Release-candidate branch suffix.
    pub rc_branch_suffix: String,
    /// Repository root.
    pub project_root: Utf8PathBuf,
}

impl RunOptions {
    /// Validate a [`RunRequest`]. Blank optional values count as unset.
    pub fn from_request(request: RunRequest) -> Result<Self, ValidationError> {
        let input = validate_inputs(
            request.from_branch.trim(),
            &request.semver_part,
            request.semver.as_deref(),
        )?;

        Ok(Self {
            workflow: request.workflow,
            input,
            semver_file: non_blank(request.semver_file).map(Utf8PathBuf::from),
            package_json: non_blank(request.package_json).map(Utf8PathBuf::from),
            auto_push_remote: non_blank(request.auto_push_remote),
            rc_branch_suffix: non_blank(request.rc_branch_suffix)
                .unwrap_or_else(|| DEFAULT_RC_BRANCH_SUFFIX.to_string()),
            project_root: request.project_root,
        })
    }

    /// The branch the run starts from.
    pub fn from_branch(&self) -> &str {
        self.input.from_branch.as_str()
    }

    /// The version part to increase.
    pub const fn semver_part(&self) -> VersionPart {
        self.input.semver_part
    }

    /// Name of the release-candidate branch for `version`.
    pub fn rc_branch(&self, version: &Version) -> String {
        format!("{version}{}", self.rc_branch_suffix)
    }

    fn full_path(&self, path: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        path.map(|p| self.project_root.join(p))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One line of the step report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// The step.
    pub step: Step,
    /// How it went.
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Which command ran.
    pub workflow: Workflow,
    /// Version before the bump.
    pub previous: Version,
    /// Version after the bump.
    pub version: Version,
    /// Where `previous` came from.
    pub source: SourceKind,
    /// The branch the run ended on.
    pub branch: String,
    /// The release-candidate branch, if one was created.
    pub release_branch: Option<String>,
    /// Files written.
    pub touched_files: Vec<Utf8PathBuf>,
    /// Whether a commit was created.
    pub committed: bool,
    /// Whether the version tag was created.
    pub tagged: bool,
    /// Every step, in order.
    pub steps: Vec<StepReport>,
}

impl RunOutcome {
    /// Steps that failed and were continued past.
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| s.outcome.is_failure())
    }
}

/// Run the bump or release pipeline.
#[instrument(skip_all, fields(workflow = %options.workflow, from_branch = options.from_branch()))]
pub async fn run(
    options: &RunOptions,
    vcs: &dyn Vcs,
    on_event: impl FnMut(&PipelineEvent),
) -> PipelineResult<RunOutcome> {
    let mut journal = Journal::new(on_event);
    let branch = options.from_branch();
    let state = PipelineState::new(branch);

    // ── Sync ──
    let state = attempt_with(
        &mut journal,
        Step::Status,
        state,
        vcs.status(),
        |state, output: String| {
            info!(status = %output.trim_end(), "working tree status");
            (state, summarize_status(&output))
        },
    )
    .await;
    let state = attempt(
        &mut journal,
        Step::Checkout,
        state,
        vcs.checkout(branch),
        format!("on {branch}"),
    )
    .await;
    let state = attempt(&mut journal, Step::Pull, state, vcs.pull(), "pulled").await;

    // ── Version ──
    journal.start(Step::Resolve);
    let semver_file = options.full_path(options.semver_file.as_deref());
    let package_json = options.full_path(options.package_json.as_deref());
    let sources = resolve::sources(
        options.input.version.as_ref(),
        semver_file.as_deref(),
        package_json.as_deref(),
    );
    let resolved = match resolve::resolve_current(&sources, vcs).await {
        Ok(resolved) => resolved,
        Err(e) => {
            journal.abort(Step::Resolve, &e);
            return Err(e.into());
        }
    };
    journal.succeed(
        Step::Resolve,
        format!("{} from {}", resolved.version, resolved.source),
    );

    journal.start(Step::Bump);
    let next = match version::next_version(&resolved.version, options.semver_part()) {
        Ok(next) => next,
        Err(e) => {
            journal.abort(Step::Bump, &e);
            return Err(e.into());
        }
    };
    journal.succeed(
        Step::Bump,
        format!("{} → {next} ({})", resolved.version, options.semver_part()),
    );
    let state = state.record_versions(resolved.version.clone(), resolved.source, next.clone());

    // ── Persist ──
    let root = options.project_root.as_path();
    let state = persist::write_version_file(
        &mut journal,
        vcs,
        root,
        options.semver_file.as_deref(),
        state,
    )
    .await;
    let state = match persist::write_manifest_file(
        &mut journal,
        vcs,
        root,
        options.package_json.as_deref(),
        state,
    )
    .await
    {
        Ok(state) => state,
        Err(e) => {
            journal.abort(Step::WriteManifest, &e);
            return Err(e.into());
        }
    };

    // ── Record ──
    let state = if state.has_changes() {
        let message = options.workflow.commit_message(&next);
        attempt_with(
            &mut journal,
            Step::Commit,
            state,
            vcs.commit(&message),
            |state, _| (state.record_commit(), format!("committed \"{message}\"")),
        )
        .await
    } else {
        journal.skip(Step::Commit, "no files were written");
        state
    };

    let tag = next.to_string();
    let state = attempt_with(
        &mut journal,
        Step::Tag,
        state,
        vcs.tag(&tag),
        |state, _| (state.record_tag(), format!("tagged {tag}")),
    )
    .await;

    // ── Publish ──
    let remote = options.auto_push_remote.as_deref();
    let state = match remote {
        None => {
            journal.skip(Step::PushCommit, NO_REMOTE);
            state
        }
        Some(_) if options.workflow == Workflow::Bump && !state.committed => {
            journal.skip(Step::PushCommit, "nothing was committed");
            state
        }
        Some(remote) => {
            attempt(
                &mut journal,
                Step::PushCommit,
                state,
                vcs.push(&[remote, branch]),
                format!("pushed {branch} to {remote}"),
            )
            .await
        }
    };

    let state = if options.workflow == Workflow::Release {
        cut_release_branch(&mut journal, vcs, options, remote, &next, state).await
    } else {
        state
    };

    let state = match remote {
        None => {
            journal.skip(Step::PushTags, NO_REMOTE);
            state
        }
        Some(remote) => {
            attempt(
                &mut journal,
                Step::PushTags,
                state,
                vcs.push(&["-u", remote, "--tags"]),
                format!("pushed tags to {remote}"),
            )
            .await
        }
    };

    // ── Report ──
    let outcome = RunOutcome {
        workflow: options.workflow,
        previous: resolved.version,
        version: next,
        source: resolved.source,
        branch: state.reported_branch().to_string(),
        release_branch: state.release_branch,
        touched_files: state.touched_files,
        committed: state.committed,
        tagged: state.tagged,
        steps: journal
            .into_steps()
            .into_iter()
            .map(|(step, outcome)| StepReport { step, outcome })
            .collect(),
    };
    info!(
        version = %outcome.version,
        branch = %outcome.branch,
        failures = outcome.failures().count(),
        "run complete"
    );
    Ok(outcome)
}

/// One-line summary of `git status` output for the step report.
fn summarize_status(output: &str) -> String {
    let first = output.lines().map(str::trim).find(|l| !l.is_empty());
    match first {
        None => "working tree checked".to_string(),
        Some(first) if output.contains("nothing to commit") => {
            format!("{first}, working tree clean")
        }
        Some(first) => format!("{first}, working tree has changes"),
    }
}

/// Create the release-candidate branch and push it.
async fn cut_release_branch(
    journal: &mut Journal<'_>,
    vcs: &dyn Vcs,
    options: &RunOptions,
    remote: Option<&str>,
    version: &Version,
    state: PipelineState,
) -> PipelineState {
    let name = options.rc_branch(version);
    let state = attempt_with(
        journal,
        Step::CreateBranch,
        state,
        vcs.create_branch(&name),
        |state, _| (state.record_release_branch(&name), format!("created {name}")),
    )
    .await;

    match (remote, state.release_branch.as_deref()) {
        (None, _) => {
            journal.skip(Step::PushBranch, NO_REMOTE);
            state
        }
        (Some(_), None) => {
            journal.skip(Step::PushBranch, format!("{name} was not created"));
            state
        }
        (Some(remote), Some(_)) => {
            attempt(
                journal,
                Step::PushBranch,
                state,
                vcs.push(&["-u", remote, name.as_str()]),
                format!("pushed {name} to {remote}"),
            )
            .await
        }
    }
}
