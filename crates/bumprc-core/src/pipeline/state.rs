//! Pipeline state, moved through every step of a run.
//!
//! Each step takes a [`PipelineState`] by value and hands back the
//! (possibly updated) state. A failed step hands back what it was given, so
//! whatever the run has accumulated at the end is what actually happened.

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::resolve::SourceKind;

/// Accumulated results of a bump or release run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    // ── Version ──
    /// The version found before bumping.
    pub previous: Option<Version>,
    /// The bumped version.
    pub version: Option<Version>,
    /// Where `previous` came from.
    pub source: Option<SourceKind>,

    // ── Repository ──
    /// The branch the run started from.
    pub branch: String,

    // ── Results ──
    /// Files written and staged, in write order.
    pub touched_files: Vec<Utf8PathBuf>,
    /// Whether the commit was created.
    pub committed: bool,
    /// Whether the version tag was created.
    pub tagged: bool,
    /// The release-candidate branch, once created.
    pub release_branch: Option<String>,
}

impl PipelineState {
    /// Fresh state for a run starting on `branch`.
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            previous: None,
            version: None,
            source: None,
            branch: branch.into(),
            touched_files: Vec::new(),
            committed: false,
            tagged: false,
            release_branch: None,
        }
    }

    /// Record the resolved and bumped versions.
    pub fn record_versions(mut self, previous: Version, source: SourceKind, next: Version) -> Self {
        self.previous = Some(previous);
        self.source = Some(source);
        self.version = Some(next);
        self
    }

    /// Append a written file.
    pub fn record_touched(mut self, path: &Utf8Path) -> Self {
        self.touched_files.push(path.to_path_buf());
        self
    }

    /// Mark the commit as created.
    pub fn record_commit(mut self) -> Self {
        self.committed = true;
        self
    }

    /// Mark the tag as created.
    pub fn record_tag(mut self) -> Self {
        self.tagged = true;
        self
    }

    /// Record the created release-candidate branch.
    pub fn record_release_branch(mut self, name: impl Into<String>) -> Self {
        self.release_branch = Some(name.into());
        self
    }

    /// Whether any file was written.
    pub fn has_changes(&self) -> bool {
        !self.touched_files.is_empty()
    }

    /// The branch to report: the release branch if one was cut, otherwise
    /// the starting branch.
    pub fn reported_branch(&self) -> &str {
        self.release_branch.as_deref().unwrap_or(&self.branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_empty() {
        let state = PipelineState::new("develop");
        assert_eq!(state.branch, "develop");
        assert!(state.version.is_none());
        assert!(!state.has_changes());
        assert!(!state.committed);
        assert!(!state.tagged);
        assert_eq!(state.reported_branch(), "develop");
    }

    #[test]
    fn record_touched_keeps_order() {
        let state = PipelineState::new("develop")
            .record_touched(Utf8Path::new("VERSION"))
            .record_touched(Utf8Path::new("package.json"));
        assert!(state.has_changes());
        assert_eq!(state.touched_files, vec!["VERSION", "package.json"]);
    }

    #[test]
    fn reported_branch_prefers_release_branch() {
        let state = PipelineState::new("develop").record_release_branch("1.3.0_Release_Candidate");
        assert_eq!(state.reported_branch(), "1.3.0_Release_Candidate");
    }

    #[test]
    fn record_versions_sets_all_three() {
        let state = PipelineState::new("main").record_versions(
            Version::new(1, 2, 3),
            SourceKind::Tags,
            Version::new(1, 3, 0),
        );
        assert_eq!(state.previous, Some(Version::new(1, 2, 3)));
        assert_eq!(state.version, Some(Version::new(1, 3, 0)));
        assert_eq!(state.source, Some(SourceKind::Tags));
    }

    #[test]
    fn json_round_trip() {
        let state = PipelineState::new("develop")
            .record_versions(
                Version::new(0, 9, 0),
                SourceKind::VersionFile,
                Version::new(0, 9, 1),
            )
            .record_touched(Utf8Path::new("VERSION"))
            .record_commit()
            .record_tag();

        let json = serde_json::to_string(&state).unwrap();
        let back: PipelineState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
