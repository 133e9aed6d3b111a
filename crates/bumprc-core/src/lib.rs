//! Core library for bumprc.
//!
//! Everything `bumprc bump` and `bumprc release` do lives here; the binary
//! only parses arguments, loads config, and renders progress.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and management
//! - [`error`] - Configuration error types
//! - [`git`] - The [`Vcs`](git::Vcs) trait, the `git` CLI backend, and a mock
//! - [`persist`] - Writing the new version to the version file and manifest
//! - [`pipeline`] - The bump/release run, step journal, and continue-on-failure helper
//! - [`resolve`] - Finding the current version
//! - [`validate`] - Command input validation
//! - [`version`] - Version cleaning, ordering, and increments
//!
//! # Quick Start
//!
//! ```no_run
//! use bumprc_core::git::GitCli;
//! use bumprc_core::pipeline::{self, RunOptions, RunRequest, Workflow};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let options = RunOptions::from_request(RunRequest {
//!     workflow: Workflow::Bump,
//!     from_branch: "develop".into(),
//!     semver_part: "minor".into(),
//!     semver_file: Some("VERSION".into()),
//!     project_root: ".".into(),
//!     ..RunRequest::default()
//! })?;
//! let git = GitCli::locate(".")?;
//! let outcome = pipeline::run(&options, &git, |_| {}).await?;
//! println!("{} -> {}", outcome.previous, outcome.version);
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod config;

pub mod error;

pub mod git;

pub mod persist;

pub mod pipeline;

pub mod resolve;

pub mod validate;

pub mod version;

pub use config::{Config, ConfigLoader, DefaultsConfig, LogLevel};

pub use error::{ConfigError, ConfigResult};

pub use pipeline::{PipelineError, RunOptions, RunOutcome, RunRequest, Workflow};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
