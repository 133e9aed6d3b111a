//! Scriptable [`Vcs`] for tests and dry experiments.
//!
//! Records every call in order, answers `list_tags` from a fixed list, and
//! fails any operation registered with [`MockVcs::failing`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};

use super::{GitError, GitResult, Vcs};

/// Kind of operation, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsOp {
    /// `status`
    Status,
    /// `checkout`
    Checkout,
    /// `checkout -b`
    CreateBranch,
    /// `pull`
    Pull,
    /// `add`
    Add,
    /// `commit`
    Commit,
    /// `tag`
    Tag,
    /// `push`
    Push,
    /// `tag --list`
    ListTags,
}

/// A recorded call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    /// `status`
    Status,
    /// `checkout <branch>`
    Checkout(String),
    /// `checkout -b <branch>`
    CreateBranch(String),
    /// `pull`
    Pull,
    /// `add <path>`
    Add(Utf8PathBuf),
    /// `commit -m <message>`
    Commit(String),
    /// `tag <name>`
    Tag(String),
    /// `push <args...>`
    Push(Vec<String>),
    /// `tag --list`
    ListTags,
}

impl VcsCall {
    /// The operation kind of this call.
    pub const fn op(&self) -> VcsOp {
        match self {
            Self::Status => VcsOp::Status,
            Self::Checkout(_) => VcsOp::Checkout,
            Self::CreateBranch(_) => VcsOp::CreateBranch,
            Self::Pull => VcsOp::Pull,
            Self::Add(_) => VcsOp::Add,
            Self::Commit(_) => VcsOp::Commit,
            Self::Tag(_) => VcsOp::Tag,
            Self::Push(_) => VcsOp::Push,
            Self::ListTags => VcsOp::ListTags,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    tags: Vec<String>,
    status: String,
    failing: HashSet<VcsOp>,
    calls: Vec<VcsCall>,
}

/// In-memory [`Vcs`] double.
#[derive(Debug, Clone, Default)]
pub struct MockVcs {
    state: Arc<Mutex<MockState>>,
}

impl MockVcs {
    /// Create a mock with no tags and no scripted failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags returned by `list_tags`.
    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Output returned by `status`.
    pub fn with_status(self, output: impl Into<String>) -> Self {
        self.lock().status = output.into();
        self
    }

    /// Make every call of `op` fail.
    pub fn failing(self, op: VcsOp) -> Self {
        self.lock().failing.insert(op);
        self
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<VcsCall> {
        self.lock().calls.clone()
    }

    /// Calls of a single kind, in order.
    pub fn calls_of(&self, op: VcsOp) -> Vec<VcsCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    /// Tags created through `tag` so far.
    pub fn created_tags(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                VcsCall::Tag(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: VcsCall) -> GitResult<String> {
        let op = call.op();
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(&op) {
            return Err(GitError::Command {
                command: format!("{op:?}").to_lowercase(),
                stderr: "scripted failure".into(),
            });
        }
        Ok(String::new())
    }
}

#[async_trait]
impl Vcs for MockVcs {
    async fn status(&self) -> GitResult<String> {
        self.record(VcsCall::Status)?;
        Ok(self.lock().status.clone())
    }

    async fn checkout(&self, branch: &str) -> GitResult<String> {
        self.record(VcsCall::Checkout(branch.to_string()))
    }

    async fn create_branch(&self, branch: &str) -> GitResult<String> {
        self.record(VcsCall::CreateBranch(branch.to_string()))
    }

    async fn pull(&self) -> GitResult<String> {
        self.record(VcsCall::Pull)
    }

    async fn add(&self, path: &Utf8Path) -> GitResult<String> {
        self.record(VcsCall::Add(path.to_path_buf()))
    }

    async fn commit(&self, message: &str) -> GitResult<String> {
        self.record(VcsCall::Commit(message.to_string()))
    }

    async fn tag(&self, name: &str) -> GitResult<String> {
        self.record(VcsCall::Tag(name.to_string()))
    }

    async fn push(&self, args: &[&str]) -> GitResult<String> {
        self.record(VcsCall::Push(
            args.iter().map(|a| (*a).to_string()).collect(),
        ))
    }

    async fn list_tags(&self) -> GitResult<Vec<String>> {
        self.record(VcsCall::ListTags)?;
        Ok(self.lock().tags.clone())
    }
}
