//! Release command: bump, then cut and push a release-candidate branch.

use clap::Args;
use tracing::{debug, instrument};

use bumprc_core::config::Config;
use bumprc_core::pipeline::Workflow;

use super::run::{self, OutputMode, RunArgs};

/// Arguments for the `release` subcommand.
#[derive(Args, Debug, Default)]
pub struct ReleaseArgs {
    /// Options shared by both commands.
    #[command(flatten)]
    pub run: RunArgs,

    /// Appended to the new version to name the branch [default: _Release_Candidate]
    #[arg(long, value_name = "SUFFIX")]
    pub rc_branch_suffix: Option<String>,
}

/// Execute the release command.
#[instrument(name = "cmd_release", skip_all)]
pub fn cmd_release(
    args: ReleaseArgs,
    output: OutputMode,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(
        json_output = output.json,
        suffix = ?args.rc_branch_suffix,
        "executing release command"
    );
    let request = args.run.into_request(
        Workflow::Release,
        args.rc_branch_suffix,
        &config.defaults,
        cwd,
    );
    run::execute(request, output)
}
