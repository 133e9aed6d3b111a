//! Bump command: increase the version on the source branch.

use clap::Args;
use tracing::{debug, instrument};

use bumprc_core::config::Config;
use bumprc_core::pipeline::Workflow;

use super::run::{self, OutputMode, RunArgs};

/// Arguments for the `bump` subcommand.
#[derive(Args, Debug, Default)]
pub struct BumpArgs {
    /// Options shared by both commands.
    #[command(flatten)]
    pub run: RunArgs,
}

/// Execute the bump command.
#[instrument(name = "cmd_bump", skip_all)]
pub fn cmd_bump(
    args: BumpArgs,
    output: OutputMode,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = output.json, "executing bump command");
    let request = args
        .run
        .into_request(Workflow::Bump, None, &config.defaults, cwd);
    run::execute(request, output)
}
