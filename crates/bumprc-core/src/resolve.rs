//! Current-version resolution.
//!
//! The current version is the first one found among an ordered list of
//! [`VersionSource`]s:
//!
//! 1. an explicit `--semver` override,
//! 2. the plain version file,
//! 3. the `version` field of a JSON manifest,
//! 4. the highest semver-valid git tag.
//!
//! A source that is missing, unreadable, or holds something that isn't a
//! semantic version is logged and skipped. Only when every source comes up
//! empty does resolution fail.

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::git::Vcs;
use crate::version;

/// Errors from version resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No source yielded a version.
    #[error("no semver found (tried: {tried}); pass --semver, or add a version file, manifest, or tag")]
    NotFound {
        /// Sources consulted, comma-separated.
        tried: String,
    },
}

/// Result alias for resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Which kind of source produced the current version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `--semver`
    Explicit,
    /// The plain version file.
    VersionFile,
    /// The JSON manifest.
    Manifest,
    /// Git tags.
    Tags,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit => write!(f, "--semver"),
            Self::VersionFile => write!(f, "version file"),
            Self::Manifest => write!(f, "manifest"),
            Self::Tags => write!(f, "git tags"),
        }
    }
}

/// A place the current version may be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// An already-validated override.
    Explicit(Version),
    /// A file holding just the version.
    VersionFile(Utf8PathBuf),
    /// A JSON file with a top-level `version` field.
    Manifest(Utf8PathBuf),
    /// The repository's tag list.
    Tags,
}

impl VersionSource {
    /// The kind of this source.
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Explicit(_) => SourceKind::Explicit,
            Self::VersionFile(_) => SourceKind::VersionFile,
            Self::Manifest(_) => SourceKind::Manifest,
            Self::Tags => SourceKind::Tags,
        }
    }

    /// Try this source. `None` means "not here, keep looking".
    async fn read(&self, vcs: &dyn Vcs) -> Option<Version> {
        match self {
            Self::Explicit(v) => Some(v.clone()),
            Self::VersionFile(path) => read_version_file(path).await,
            Self::Manifest(path) => read_manifest_version(path).await,
            Self::Tags => read_tags(vcs).await,
        }
    }
}

/// The resolved current version and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The current version.
    pub version: Version,
    /// The source that supplied it.
    pub source: SourceKind,
}

/// Build the source list in precedence order.
///
/// `version_file` and `manifest` should already be resolved against the
/// project root.
pub fn sources(
    explicit: Option<&Version>,
    version_file: Option<&Utf8Path>,
    manifest: Option<&Utf8Path>,
) -> Vec<VersionSource> {
    let mut list = Vec::with_capacity(4);
    if let Some(v) = explicit {
        list.push(VersionSource::Explicit(v.clone()));
    }
    if let Some(path) = version_file {
        list.push(VersionSource::VersionFile(path.to_path_buf()));
    }
    if let Some(path) = manifest {
        list.push(VersionSource::Manifest(path.to_path_buf()));
    }
    list.push(VersionSource::Tags);
    list
}

/// Return the version from the first source that has one.
#[instrument(skip_all, fields(sources = sources.len()))]
pub async fn resolve_current(
    sources: &[VersionSource],
    vcs: &dyn Vcs,
) -> ResolveResult<Resolved> {
    for source in sources {
        if let Some(version) = source.read(vcs).await {
            let kind = source.kind();
            info!(%version, source = %kind, "resolved current version");
            return Ok(Resolved {
                version,
                source: kind,
            });
        }
        debug!(source = %source.kind(), "no version from source");
    }

    let tried = sources
        .iter()
        .map(|s| s.kind().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(ResolveError::NotFound { tried })
}

async fn read_version_file(path: &Utf8Path) -> Option<Version> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(%path, error = %e, "could not read version file");
            return None;
        }
    };

    let version = version::clean(&contents);
    if version.is_none() {
        warn!(%path, contents = contents.trim(), "version file does not hold a valid semver");
    }
    version
}

async fn read_manifest_version(path: &Utf8Path) -> Option<Version> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(%path, error = %e, "could not read manifest");
            return None;
        }
    };

    let json: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(json) => json,
        Err(e) => {
            warn!(%path, error = %e, "manifest is not valid JSON");
            return None;
        }
    };

    let Some(raw) = json.get("version").and_then(serde_json::Value::as_str) else {
        debug!(%path, "manifest has no string version field");
        return None;
    };

    let version = version::clean(raw);
    if version.is_none() {
        warn!(%path, version = raw, "manifest version is not a valid semver");
    }
    version
}

async fn read_tags(vcs: &dyn Vcs) -> Option<Version> {
    match vcs.list_tags().await {
        Ok(tags) => {
            let highest = version::highest(&tags);
            debug!(count = tags.len(), ?highest, "scanned tags");
            highest
        }
        Err(e) => {
            warn!(error = %e, "could not list tags");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{MockVcs, VcsOp};
    use tempfile::TempDir;

    fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[tokio::test]
    async fn version_file_beats_manifest_and_tags() {
        let (_tmp, dir) = utf8_tempdir();
        std::fs::write(dir.join("VERSION"), "v1.0.0\n").unwrap();
        std::fs::write(dir.join("package.json"), r#"{"version":"2.0.0"}"#).unwrap();
        let vcs = MockVcs::new().with_tags(["3.0.0"]);

        let list = sources(
            None,
            Some(&dir.join("VERSION")),
            Some(&dir.join("package.json")),
        );
        let resolved = resolve_current(&list, &vcs).await.unwrap();

        assert_eq!(resolved.version, v("1.0.0"));
        assert_eq!(resolved.source, SourceKind::VersionFile);
        assert!(vcs.calls_of(VcsOp::ListTags).is_empty());
    }

    #[tokio::test]
    async fn manifest_beats_tags() {
        let (_tmp, dir) = utf8_tempdir();
        std::fs::write(dir.join("package.json"), r#"{"name":"app","version":"2.0.0"}"#).unwrap();
        let vcs = MockVcs::new().with_tags(["3.0.0"]);

        let list = sources(
            None,
            Some(&dir.join("VERSION")),
            Some(&dir.join("package.json")),
        );
        let resolved = resolve_current(&list, &vcs).await.unwrap();

        assert_eq!(resolved.version, v("2.0.0"));
        assert_eq!(resolved.source, SourceKind::Manifest);
    }

    #[tokio::test]
    async fn explicit_beats_everything() {
        let (_tmp, dir) = utf8_tempdir();
        std::fs::write(dir.join("VERSION"), "1.0.0\n").unwrap();
        let vcs = MockVcs::new();

        let explicit = v("5.0.0");
        let list = sources(Some(&explicit), Some(&dir.join("VERSION")), None);
        let resolved = resolve_current(&list, &vcs).await.unwrap();

        assert_eq!(resolved.version, explicit);
        assert_eq!(resolved.source, SourceKind::Explicit);
    }

    #[tokio::test]
    async fn tags_pick_highest_by_precedence() {
        let vcs = MockVcs::new().with_tags(["1.2.0", "1.10.0", "1.9.9", "nightly"]);
        let resolved = resolve_current(&sources(None, None, None), &vcs)
            .await
            .unwrap();

        assert_eq!(resolved.version, v("1.10.0"));
        assert_eq!(resolved.source, SourceKind::Tags);
    }

    #[tokio::test]
    async fn invalid_sources_fall_through() {
        let (_tmp, dir) = utf8_tempdir();
        std::fs::write(dir.join("VERSION"), "not a version\n").unwrap();
        std::fs::write(dir.join("package.json"), "{ broken").unwrap();
        let vcs = MockVcs::new().with_tags(["v0.4.2"]);

        let list = sources(
            None,
            Some(&dir.join("VERSION")),
            Some(&dir.join("package.json")),
        );
        let resolved = resolve_current(&list, &vcs).await.unwrap();

        assert_eq!(resolved.version, v("0.4.2"));
    }

    #[tokio::test]
    async fn nothing_found_is_an_error() {
        let vcs = MockVcs::new().with_tags(["latest"]);
        let err = resolve_current(&sources(None, None, None), &vcs)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no semver found"));
    }

    #[tokio::test]
    async fn tag_listing_failure_is_treated_as_absent() {
        let vcs = MockVcs::new().failing(VcsOp::ListTags);
        let err = resolve_current(&sources(None, None, None), &vcs)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn sources_are_ordered() {
        let explicit = v("1.0.0");
        let kinds: Vec<_> = sources(
            Some(&explicit),
            Some(Utf8Path::new("VERSION")),
            Some(Utf8Path::new("package.json")),
        )
        .iter()
        .map(VersionSource::kind)
        .collect();

        assert_eq!(
            kinds,
            vec![
                SourceKind::Explicit,
                SourceKind::VersionFile,
                SourceKind::Manifest,
                SourceKind::Tags
            ]
        );
    }
}
