//! Command input validation.
//!
//! Runs before any side effect. Every check runs and every failure is
//! reported together, so a user fixing a bad invocation sees all problems
//! at once.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::version::{self, ALLOWED_PARTS, VersionPart};

/// Branch names accepted by `--from-branch`.
pub const BRANCH_PATTERN: &str = r"^[A-Za-z0-9_-]{2,55}$";

static BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(BRANCH_PATTERN).expect("branch pattern is a valid regex"));

/// The input field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Field {
    /// `--semver-part`
    SemverPart,
    /// `--from-branch`
    FromBranch,
    /// `--semver`
    Semver,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SemverPart => write!(f, "semver-part"),
            Self::FromBranch => write!(f, "from-branch"),
            Self::Semver => write!(f, "semver"),
        }
    }
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Which input was rejected.
    pub field: Field,
    /// Human-readable reason.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}: {}", self.field, self.message)
    }
}

/// Validation failures, all collected.
#[derive(Error, Debug)]
#[error("invalid arguments: {}", join(.0))]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    /// Whether `field` is among the failures.
    pub fn mentions(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A branch name that passed [`BRANCH_PATTERN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BranchName(String);

impl BranchName {
    /// Validate a branch name.
    pub fn parse(name: &str) -> Option<Self> {
        BRANCH_RE.is_match(name).then(|| Self(name.to_string()))
    }

    /// The branch name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized command input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    /// Part to increase.
    pub semver_part: VersionPart,
    /// Branch to check out before running.
    pub from_branch: BranchName,
    /// Explicit version override, cleaned.
    pub version: Option<Version>,
}

/// Validate `(from_branch, semver_part, explicit_semver)`.
///
/// An empty or whitespace-only `explicit_semver` counts as absent.
#[instrument]
pub fn validate_inputs(
    from_branch: &str,
    semver_part: &str,
    explicit_semver: Option<&str>,
) -> Result<ValidatedInput, ValidationError> {
    let mut errors = Vec::new();

    let part = semver_part.parse::<VersionPart>().map_err(|_| FieldError {
        field: Field::SemverPart,
        message: format!("\"{semver_part}\" is not one of {ALLOWED_PARTS}"),
    });

    let branch = BranchName::parse(from_branch).ok_or_else(|| FieldError {
        field: Field::FromBranch,
        message: format!("\"{from_branch}\" doesn't match pattern {BRANCH_PATTERN}"),
    });

    let explicit = explicit_semver
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            version::clean(s).ok_or_else(|| FieldError {
                field: Field::Semver,
                message: format!("\"{s}\" is not a valid semver string"),
            })
        })
        .transpose();

    let part = part.map_err(|e| errors.push(e)).ok();
    let branch = branch.map_err(|e| errors.push(e)).ok();
    let explicit = explicit.map_err(|e| errors.push(e)).ok().flatten();

    match (part, branch) {
        (Some(semver_part), Some(from_branch)) if errors.is_empty() => {
            debug!(%semver_part, %from_branch, ?explicit, "inputs validated");
            Ok(ValidatedInput {
                semver_part,
                from_branch,
                version: explicit,
            })
        }
        _ => Err(ValidationError(errors)),
    }
}
