//! Writing the new version to disk.
//!
//! Two destinations, both optional, written in this order:
//!
//! - a plain version file holding `"{version}\n"`
//! - a JSON manifest whose top-level `version` field is replaced in place,
//!   keeping key order, indentation, and the trailing newline
//!
//! Each successfully written file is appended to
//! [`PipelineState::touched_files`] and staged with `git add`. Write and
//! stage failures are recorded in the journal and the run continues. A
//! manifest that exists but is not a JSON object is the one fatal case: the
//! user asked for it to be rewritten and it can't be.

use std::future::Future;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::git::Vcs;
use crate::pipeline::attempt::{attempt, attempt_with};
use crate::pipeline::event::{Journal, Step};
use crate::pipeline::state::PipelineState;

/// Errors from manifest persistence.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The manifest exists but is not valid JSON.
    #[error("manifest {path} is not valid JSON: {source}")]
    MalformedManifest {
        /// The manifest path.
        path: Utf8PathBuf,
        /// The parse error.
        source: serde_json::Error,
    },

    /// The manifest's top level is not an object.
    #[error("manifest {path} must be a JSON object")]
    ManifestNotObject {
        /// The manifest path.
        path: Utf8PathBuf,
    },
}

/// Result alias for persistence.
pub type PersistResult<T> = Result<T, PersistError>;

/// Indentation used when a manifest has no indented line to copy.
pub const DEFAULT_INDENT: &str = "  ";

/// Write `state.version` to the plain version file at `root/path`.
///
/// Passes `state` through untouched when `path` is `None` or no version has
/// been computed.
#[instrument(skip(journal, vcs, state), fields(version = ?state.version))]
pub async fn write_version_file(
    journal: &mut Journal<'_>,
    vcs: &dyn Vcs,
    root: &Utf8Path,
    path: Option<&Utf8Path>,
    state: PipelineState,
) -> PipelineState {
    let (Some(path), Some(version)) = (path, state.version.clone()) else {
        return state;
    };

    let full = root.join(path);
    let state = attempt_with(
        journal,
        Step::WriteVersionFile,
        state,
        tokio::fs::write(&full, format!("{version}\n")),
        |state, ()| (state.record_touched(path), format!("wrote {version} to {path}")),
    )
    .await;

    stage(journal, vcs, path, state).await
}

/// Set the `version` field of the JSON manifest at `root/path`.
///
/// A missing or unreadable manifest is skipped. A manifest that does not
/// parse, or whose root is not an object, is an error.
#[instrument(skip(journal, vcs, state), fields(version = ?state.version))]
pub async fn write_manifest_file(
    journal: &mut Journal<'_>,
    vcs: &dyn Vcs,
    root: &Utf8Path,
    path: Option<&Utf8Path>,
    state: PipelineState,
) -> PersistResult<PipelineState> {
    rewrite_manifest(journal, vcs, root, path, state, |full, bytes| async move {
        tokio::fs::write(full, bytes).await
    })
    .await
}

/// [`write_manifest_file`] with the final write supplied by the caller.
async fn rewrite_manifest<W, Fut>(
    journal: &mut Journal<'_>,
    vcs: &dyn Vcs,
    root: &Utf8Path,
    path: Option<&Utf8Path>,
    state: PipelineState,
    write_file: W,
) -> PersistResult<PipelineState>
where
    W: FnOnce(Utf8PathBuf, Vec<u8>) -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    let (Some(path), Some(version)) = (path, state.version.clone()) else {
        return Ok(state);
    };

    let full = root.join(path);
    let original = match tokio::fs::read_to_string(&full).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            journal.skip(Step::WriteManifest, format!("{path} does not exist"));
            return Ok(state);
        }
        Err(e) => {
            journal.fail(Step::WriteManifest, &format!("could not read {path}: {e}"));
            return Ok(state);
        }
    };

    let mut json: serde_json::Value =
        serde_json::from_str(&original).map_err(|source| PersistError::MalformedManifest {
            path: path.to_path_buf(),
            source,
        })?;
    let Some(fields) = json.as_object_mut() else {
        return Err(PersistError::ManifestNotObject {
            path: path.to_path_buf(),
        });
    };
    fields.insert(
        "version".to_string(),
        serde_json::Value::String(version.to_string()),
    );

    let indent = detect_indent(&original);
    let trailing_newline = original.ends_with('\n');
    debug!(%path, indent = ?indent, trailing_newline, "rewriting manifest");

    let write = async {
        let bytes = render_json(&json, indent, trailing_newline)?;
        write_file(full, bytes).await
    };
    let state = attempt_with(journal, Step::WriteManifest, state, write, |state, ()| {
        (
            state.record_touched(path),
            format!("set {path} version to {version}"),
        )
    })
    .await;

    Ok(stage(journal, vcs, path, state).await)
}

/// Stage `path` if the preceding write recorded it.
async fn stage(
    journal: &mut Journal<'_>,
    vcs: &dyn Vcs,
    path: &Utf8Path,
    state: PipelineState,
) -> PipelineState {
    if !state.touched_files.iter().any(|p| p == path) {
        return state;
    }
    attempt(
        journal,
        Step::Stage,
        state,
        vcs.add(path),
        format!("staged {path}"),
    )
    .await
}

/// Leading whitespace of the first indented line, or [`DEFAULT_INDENT`].
pub fn detect_indent(text: &str) -> &str {
    text.lines()
        .find_map(|line| {
            let body = line.trim_start_matches([' ', '\t']);
            let width = line.len() - body.len();
            (width > 0 && !body.is_empty()).then(|| &line[..width])
        })
        .unwrap_or(DEFAULT_INDENT)
}

/// Pretty-print `value` with `indent`, optionally newline-terminated.
fn render_json(
    value: &serde_json::Value,
    indent: &str,
    trailing_newline: bool,
) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
    value.serialize(&mut ser)?;
    if trailing_newline {
        buf.push(b'\n');
    }
    Ok(buf)
}
