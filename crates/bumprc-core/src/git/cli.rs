//! [`Vcs`] implementation that shells out to `git`.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{GitError, GitResult, Vcs, parse_tag_list};

/// Runs `git` as a subprocess in a fixed working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: Utf8PathBuf,
    program: Utf8PathBuf,
}

impl GitCli {
    /// Locate `git` on `PATH` and bind it to `root`.
    pub fn locate(root: impl Into<Utf8PathBuf>) -> GitResult<Self> {
        let program = which::which("git")?;
        let program = Utf8PathBuf::from_path_buf(program)
            .unwrap_or_else(|_| Utf8PathBuf::from("git"));
        Ok(Self {
            root: root.into(),
            program,
        })
    }

    /// The working directory commands run in.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Run a git command and return its stdout.
    #[instrument(skip(self), fields(root = %self.root))]
    async fn git(&self, args: &[&str]) -> GitResult<String> {
        let output = Command::new(self.program.as_std_path())
            .args(args)
            .current_dir(self.root.as_std_path())
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            // git reports progress for push/pull/checkout on stderr
            if !stderr.is_empty() {
                debug!(%stderr, "git stderr");
            }
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }

        if stderr.contains("not a git repository") {
            return Err(GitError::NotARepo);
        }

        Err(GitError::Command {
            command: args.first().unwrap_or(&"").to_string(),
            stderr,
        })
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn status(&self) -> GitResult<String> {
        self.git(&["status"]).await
    }

    async fn checkout(&self, branch: &str) -> GitResult<String> {
        self.git(&["checkout", branch]).await
    }

    async fn create_branch(&self, branch: &str) -> GitResult<String> {
        self.git(&["checkout", "-b", branch]).await
    }

    async fn pull(&self) -> GitResult<String> {
        self.git(&["pull"]).await
    }

    async fn add(&self, path: &Utf8Path) -> GitResult<String> {
        self.git(&["add", path.as_str()]).await
    }

    async fn commit(&self, message: &str) -> GitResult<String> {
        self.git(&["commit", "-m", message]).await
    }

    async fn tag(&self, name: &str) -> GitResult<String> {
        self.git(&["tag", name]).await
    }

    async fn push(&self, args: &[&str]) -> GitResult<String> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("push");
        full.extend_from_slice(args);
        self.git(&full).await
    }

    async fn list_tags(&self) -> GitResult<Vec<String>> {
        let output = self.git(&["tag", "--list"]).await?;
        let tags = parse_tag_list(&output);
        debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }
}
