//! Library interface for the `bumprc` CLI.
//!
//! This crate exposes the CLI's argument parser and command structure as a library,
//! primarily for documentation generation and testing. The actual entry point is
//! in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations
//!
//! # Documentation Generation
//!
//! The [`command()`] function returns the clap `Command` for generating man pages
//! and shell completions via `xtask`.

pub mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG            Log filter (e.g., debug, bumprc_core=trace)
    BUMPRC_LOG_PATH     Explicit log file path
    BUMPRC_LOG_DIR      Log directory

CONFIGURATION:
    Defaults for every bump/release option can be set in the [defaults]
    section of .bumprc.toml (or bumprc.toml/.yaml/.json) in the project,
    or in the user config directory.
";
/// Command-line interface definition for bumprc.
#[derive(Parser, Debug)]
#[command(name = "bumprc")]
#[command(about = "Bump semantic versions and cut release-candidate branches", long_about = None)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bump the version on the source branch, commit, tag, and push
    Bump(commands::bump::BumpArgs),

    /// Bump the version and cut a release-candidate branch
    #[command(visible_alias = "rc")]
    Release(commands::release::ReleaseArgs),
}

impl Commands {
    /// Whether `--debug` was passed to the subcommand.
    pub const fn debug(&self) -> bool {
        match self {
            Self::Bump(args) => args.run.debug,
            Self::Release(args) => args.run.debug,
        }
    }
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn rc_is_an_alias_for_release() {
        let cli = Cli::try_parse_from(["bumprc", "rc", "-s", "minor", "--remote", "origin"]).unwrap();
        let Commands::Release(args) = cli.command else {
            panic!("expected release");
        };
        assert_eq!(args.run.semver_part.as_deref(), Some("minor"));
        assert_eq!(args.run.auto_push_remote.as_deref(), Some("origin"));
    }

    #[test]
    fn short_flags_parse() {
        let cli = Cli::try_parse_from([
            "bumprc", "bump", "-b", "main", "-p", "package.json", "--semver", "1.0.0", "--debug",
        ])
        .unwrap();
        assert!(cli.command.debug());
        let Commands::Bump(args) = cli.command else {
            panic!("expected bump");
        };
        assert_eq!(args.run.from_branch.as_deref(), Some("main"));
        assert_eq!(args.run.package_json.as_deref(), Some("package.json"));
        assert_eq!(args.run.semver.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["bumprc", "release", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
    }
}
