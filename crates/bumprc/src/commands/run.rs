//! Shared plumbing for `bump` and `release`: option merging, the async
//! runtime, progress display, and the final summary.

use std::time::Duration;

use anyhow::Context;
use camino::Utf8Path;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use bumprc_core::config::DefaultsConfig;
use bumprc_core::git::GitCli;
use bumprc_core::pipeline::{
    self, DEFAULT_FROM_BRANCH, PipelineEvent, RunOptions, RunOutcome, RunRequest, StepOutcome,
    Workflow,
};
use bumprc_core::version::VersionPart;

/// Options shared by `bump` and `release`.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Branch to check out and pull before bumping [default: develop]
    #[arg(short = 'b', long, value_name = "BRANCH")]
    pub from_branch: Option<String>,

    /// Part to increase: major, minor, patch, or prerelease [default: patch]
    #[arg(short = 's', long, value_name = "PART")]
    pub semver_part: Option<String>,

    /// JSON manifest whose "version" field is read and rewritten
    #[arg(short = 'p', long, value_name = "PATH")]
    pub package_json: Option<String>,

    /// Plain-text file holding just the version
    #[arg(long, value_name = "PATH")]
    pub semver_file: Option<String>,

    /// Use this as the current version instead of looking one up
    #[arg(long, value_name = "VERSION")]
    pub semver: Option<String>,

    /// Remote to push to; nothing is pushed when unset
    #[arg(long, visible_alias = "remote", value_name = "REMOTE")]
    pub auto_push_remote: Option<String>,

    /// Log parsed arguments and every step at trace level
    #[arg(long)]
    pub debug: bool,
}

impl RunArgs {
    /// Build a request, filling unset flags from config defaults.
    pub fn into_request(
        self,
        workflow: Workflow,
        rc_branch_suffix: Option<String>,
        defaults: &DefaultsConfig,
        cwd: &Utf8Path,
    ) -> RunRequest {
        let defaults = defaults.clone();
        RunRequest {
            workflow,
            from_branch: self
                .from_branch
                .or(defaults.from_branch)
                .unwrap_or_else(|| DEFAULT_FROM_BRANCH.to_string()),
            semver_part: self
                .semver_part
                .or(defaults.semver_part)
                .unwrap_or_else(|| VersionPart::default().to_string()),
            semver: self.semver,
            semver_file: self.semver_file.or(defaults.semver_file),
            package_json: self.package_json.or(defaults.package_json),
            auto_push_remote: self.auto_push_remote.or(defaults.auto_push_remote),
            rc_branch_suffix: rc_branch_suffix.or(defaults.rc_branch_suffix),
            project_root: cwd.to_path_buf(),
        }
    }
}

/// How much to print while running.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputMode {
    /// Print the outcome as JSON instead of text.
    pub json: bool,
    /// Suppress per-step lines.
    pub quiet: bool,
}

/// Validate, run the pipeline, and print the result.
#[instrument(name = "cmd_run", skip_all, fields(workflow = %request.workflow))]
pub fn execute(request: RunRequest, output: OutputMode) -> anyhow::Result<()> {
    let workflow = request.workflow;
    let options = RunOptions::from_request(request)?;
    debug!(?options, "options validated");

    let git = GitCli::locate(options.project_root.clone()).context("git is required")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let mut progress = Progress::new(!output.json && !output.quiet);
    let outcome = runtime
        .block_on(pipeline::run(&options, &git, |event| progress.handle(event)))
        .with_context(|| format!("{workflow} failed"))?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

/// Spinner for the running step, and a line per finished one.
struct Progress {
    visible: bool,
    spinner: Option<ProgressBar>,
}

impl Progress {
    const fn new(visible: bool) -> Self {
        Self {
            visible,
            spinner: None,
        }
    }

    fn handle(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StepStarted(step) => {
                if !self.visible {
                    return;
                }
                let spinner = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
                    spinner.set_style(
                        style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
                    );
                }
                spinner.set_message(format!("{step}..."));
                spinner.enable_steady_tick(Duration::from_millis(80));
                self.spinner = Some(spinner);
            }
            PipelineEvent::StepCompleted(step, outcome) => {
                if let Some(spinner) = self.spinner.take() {
                    spinner.finish_and_clear();
                }
                if !self.visible {
                    return;
                }
                let step = step.to_string();
                match outcome {
                    StepOutcome::Success { message } => {
                        println!("  {} {} {}", "✓".green(), step.bold(), message.dimmed());
                    }
                    StepOutcome::Skipped { reason } => {
                        println!(
                            "  {} {} {}",
                            "–".yellow(),
                            step.bold(),
                            format!("skipped: {reason}").dimmed(),
                        );
                    }
                    StepOutcome::Failed { error } => {
                        println!("  {} {} {}", "✗".red(), step.bold(), error.red());
                    }
                }
            }
        }
    }
}

fn print_summary(outcome: &RunOutcome) {
    println!();
    println!(
        "{}: {} → {} {}",
        "Version".bold(),
        outcome.previous.to_string().dimmed(),
        outcome.version.to_string().green().bold(),
        format!("(from {})", outcome.source).dimmed(),
    );
    println!("{}: {}", "Branch".bold(), outcome.branch.cyan());
    for file in &outcome.touched_files {
        println!("  {} {}", "→".dimmed(), file.as_str().cyan());
    }

    let failed = outcome.failures().count();
    if failed > 0 {
        println!(
            "{}",
            format!("{failed} step(s) failed and were skipped over; see above").yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_defaults() {
        let defaults = DefaultsConfig {
            from_branch: Some("main".into()),
            semver_part: Some("minor".into()),
            auto_push_remote: Some("origin".into()),
            rc_branch_suffix: Some("-rc".into()),
            ..DefaultsConfig::default()
        };
        let args = RunArgs {
            from_branch: Some("trunk".into()),
            auto_push_remote: Some("upstream".into()),
            ..RunArgs::default()
        };

        let req = args.into_request(Workflow::Release, None, &defaults, Utf8Path::new("/repo"));

        assert_eq!(req.from_branch, "trunk");
        assert_eq!(req.semver_part, "minor");
        assert_eq!(req.auto_push_remote.as_deref(), Some("upstream"));
        assert_eq!(req.rc_branch_suffix.as_deref(), Some("-rc"));
        assert_eq!(req.project_root, "/repo");
    }

    #[test]
    fn built_in_defaults_apply_last() {
        let req = RunArgs::default().into_request(
            Workflow::Bump,
            None,
            &DefaultsConfig::default(),
            Utf8Path::new("."),
        );

        assert_eq!(req.from_branch, "develop");
        assert_eq!(req.semver_part, "patch");
        assert!(req.auto_push_remote.is_none());
        assert!(req.rc_branch_suffix.is_none());
    }
}
