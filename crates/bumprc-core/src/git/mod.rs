//! Git operations for bump and release workflows.
//!
//! The pipeline talks to version control through the [`Vcs`] trait so the
//! orchestration can be exercised without a real repository:
//!
//! - [`GitCli`] shells out to `git`, inheriting the user's SSH keys, GPG
//!   signing, hooks, and other configuration.
//! - [`MockVcs`] records every call and replays scripted tags and failures.
//!
//! Every operation is async and returns the command's stdout on success.

mod cli;
mod mock;

pub use cli::GitCli;
pub use mock::{MockVcs, VcsCall, VcsOp};

use async_trait::async_trait;
use camino::Utf8Path;
use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "push").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,

    /// No `git` executable on `PATH`.
    #[error("git executable not found: {0}")]
    NotInstalled(#[from] which::Error),
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// The version-control operations the pipeline needs.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// `git status`
    async fn status(&self) -> GitResult<String>;

    /// `git checkout <branch>`
    async fn checkout(&self, branch: &str) -> GitResult<String>;

    /// `git checkout -b <branch>`
    async fn create_branch(&self, branch: &str) -> GitResult<String>;

    /// `git pull`
    async fn pull(&self) -> GitResult<String>;

    /// `git add <path>`
    async fn add(&self, path: &Utf8Path) -> GitResult<String>;

    /// `git commit -m <message>`
    async fn commit(&self, message: &str) -> GitResult<String>;

    /// `git tag <name>` (lightweight, on HEAD)
    async fn tag(&self, name: &str) -> GitResult<String>;

    /// `git push <args...>`
    async fn push(&self, args: &[&str]) -> GitResult<String>;

    /// `git tag --list`, one name per entry.
    async fn list_tags(&self) -> GitResult<Vec<String>>;
}

/// Split `git tag --list` output into tag names.
pub(crate) fn parse_tag_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
