//! Version parsing, cleaning, ordering, and part increments.
//!
//! Parsing and precedence come from the `semver` crate. This module adds
//! the pieces it does not ship: input cleaning (`v1.2.3` → `1.2.3`), the
//! case-insensitive [`VersionPart`] keyword, and the increment rules applied
//! by `bump` and `release`.

use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    /// Failed to parse a semver string.
    #[error("invalid semver: {0}")]
    InvalidSemver(#[from] semver::Error),

    /// The version-part keyword is not one of the allowed values.
    #[error("unknown version part \"{0}\" (expected one of: {ALLOWED_PARTS})")]
    UnknownPart(String),

    /// The incremented component would not fit in a `u64`.
    #[error("cannot increase {component} of {version}: already at the maximum")]
    Overflow {
        /// Which component overflowed.
        component: &'static str,
        /// The version being increased.
        version: String,
    },
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Allowed version-part keywords, for messages.
pub const ALLOWED_PARTS: &str = "major, minor, patch, prerelease";

/// The part of a version to increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPart {
    /// Major release (X.0.0).
    Major,
    /// Minor release (x.Y.0).
    Minor,
    /// Patch release (x.y.Z).
    #[default]
    Patch,
    /// Pre-release (x.y.z-N).
    Prerelease,
}

impl FromStr for VersionPart {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "prerelease" => Ok(Self::Prerelease),
            _ => Err(VersionError::UnknownPart(s.to_string())),
        }
    }
}

impl std::fmt::Display for VersionPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::Prerelease => write!(f, "prerelease"),
        }
    }
}

/// Normalize a version-ish string: trim whitespace and strip one leading
/// `=` and one leading `v`.
///
/// Returns `None` if the cleaned string is not a valid semantic version.
pub fn clean(s: &str) -> Option<Version> {
    Version::parse(strip_prefixes(s)).ok()
}

/// Parse a version string after cleaning it.
pub fn parse_version(s: &str) -> VersionResult<Version> {
    Ok(Version::parse(strip_prefixes(s))?)
}

fn strip_prefixes(s: &str) -> &str {
    let s = s.trim();
    let s = s.strip_prefix('=').unwrap_or(s).trim_start();
    s.strip_prefix('v')
        .or_else(|| s.strip_prefix('V'))
        .unwrap_or(s)
}

/// Whether `s` cleans to a valid semantic version.
pub fn is_valid(s: &str) -> bool {
    clean(s).is_some()
}

/// Pick the highest valid version among `candidates` by semver precedence.
///
/// Invalid entries are ignored. `1.10.0` beats `1.9.9`.
pub fn highest<I, S>(candidates: I) -> Option<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .filter_map(|c| clean(c.as_ref()))
        .max()
}

/// Compute the next version by increasing `part`.
///
/// A pre-release that already sits on the target boundary is promoted
/// instead of skipped (`2.0.0-1` + major → `2.0.0`). Build metadata is
/// dropped.
pub fn next_version(current: &Version, part: VersionPart) -> VersionResult<Version> {
    let is_pre = !current.pre.is_empty();
    let inc = |value: u64, component: &'static str| {
        value.checked_add(1).ok_or_else(|| VersionError::Overflow {
            component,
            version: current.to_string(),
        })
    };
    let mut next = Version::new(current.major, current.minor, current.patch);

    match part {
        VersionPart::Major => {
            if !(is_pre && current.minor == 0 && current.patch == 0) {
                next = Version::new(inc(current.major, "major")?, 0, 0);
            }
        }
        VersionPart::Minor => {
            if !(is_pre && current.patch == 0) {
                next = Version::new(current.major, inc(current.minor, "minor")?, 0);
            }
        }
        VersionPart::Patch => {
            if !is_pre {
                next.patch = inc(next.patch, "patch")?;
            }
        }
        VersionPart::Prerelease => {
            if is_pre {
                let pre = next_prerelease(current.pre.as_str()).ok_or_else(|| {
                    VersionError::Overflow {
                        component: "prerelease",
                        version: current.to_string(),
                    }
                })?;
                next.pre = Prerelease::new(&pre)?;
            } else {
                next.patch = inc(next.patch, "patch")?;
                next.pre = Prerelease::new("0")?;
            }
        }
    }

    next.build = BuildMetadata::EMPTY;
    Ok(next)
}

/// Increase the last numeric identifier, or append `.0` when none is numeric.
///
/// `None` if the numeric identifier is already `u64::MAX`.
fn next_prerelease(pre: &str) -> Option<String> {
    let mut idents: Vec<String> = pre.split('.').map(str::to_string).collect();

    let last_numeric = idents
        .iter()
        .rposition(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()));

    match last_numeric.and_then(|i| idents[i].parse::<u64>().ok().map(|n| (i, n))) {
        Some((i, n)) => idents[i] = n.checked_add(1)?.to_string(),
        None => idents.push("0".to_string()),
    }

    Some(idents.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn part_parses_case_insensitively() {
        assert_eq!("MINOR".parse::<VersionPart>().unwrap(), VersionPart::Minor);
        assert_eq!(
            "PreRelease".parse::<VersionPart>().unwrap(),
            VersionPart::Prerelease
        );
    }

    #[test]
    fn part_rejects_unknown_keyword() {
        let err = "micro".parse::<VersionPart>().unwrap_err();
        assert!(err.to_string().contains("micro"));
        assert!(err.to_string().contains(ALLOWED_PARTS));
    }

    #[test]
    fn clean_strips_prefix_and_whitespace() {
        assert_eq!(clean("  v1.2.3\n"), Some(v("1.2.3")));
        assert_eq!(clean("=1.2.3"), Some(v("1.2.3")));
        assert_eq!(clean("1.2"), None);
        assert_eq!(clean("release-1"), None);
    }

    #[test]
    fn parse_with_v_prefix() {
        assert_eq!(parse_version("v1.2.3").unwrap(), v("1.2.3"));
        assert!(parse_version("not-a-version").is_err());
    }

    #[test]
    fn highest_is_numeric_not_lexical() {
        assert_eq!(highest(["1.2.0", "1.10.0", "1.9.9"]), Some(v("1.10.0")));
    }

    #[test]
    fn highest_ignores_invalid_and_respects_prerelease() {
        let tags = ["latest", "v2.0.0-rc.1", "1.9.0", "2.0.0-rc.0"];
        assert_eq!(highest(tags), Some(v("2.0.0-rc.1")));
        assert_eq!(highest(Vec::<String>::new()), None);
    }

    #[test]
    fn bump_release_versions() {
        let cur = v("1.2.3");
        assert_eq!(next_version(&cur, VersionPart::Major).unwrap(), v("2.0.0"));
        assert_eq!(next_version(&cur, VersionPart::Minor).unwrap(), v("1.3.0"));
        assert_eq!(next_version(&cur, VersionPart::Patch).unwrap(), v("1.2.4"));
    }

    #[test]
    fn prerelease_of_release_is_greater() {
        let cur = v("1.2.3");
        let next = next_version(&cur, VersionPart::Prerelease).unwrap();
        assert_eq!(next, v("1.2.4-0"));
        assert!(next > cur);
    }

    #[test]
    fn prerelease_increments_last_numeric_identifier() {
        assert_eq!(
            next_version(&v("1.2.4-alpha.1"), VersionPart::Prerelease).unwrap(),
            v("1.2.4-alpha.2")
        );
        assert_eq!(
            next_version(&v("1.2.4-3.beta"), VersionPart::Prerelease).unwrap(),
            v("1.2.4-4.beta")
        );
        assert_eq!(
            next_version(&v("1.2.4-alpha"), VersionPart::Prerelease).unwrap(),
            v("1.2.4-alpha.0")
        );
    }

    #[test]
    fn prerelease_on_boundary_is_promoted() {
        assert_eq!(
            next_version(&v("2.0.0-1"), VersionPart::Major).unwrap(),
            v("2.0.0")
        );
        assert_eq!(
            next_version(&v("1.3.0-rc.1"), VersionPart::Minor).unwrap(),
            v("1.3.0")
        );
        assert_eq!(
            next_version(&v("1.2.4-0"), VersionPart::Patch).unwrap(),
            v("1.2.4")
        );
        assert_eq!(
            next_version(&v("1.2.4-0"), VersionPart::Minor).unwrap(),
            v("1.3.0")
        );
    }

    #[test]
    fn build_metadata_is_dropped() {
        assert_eq!(
            next_version(&v("1.2.3+build.7"), VersionPart::Patch).unwrap(),
            v("1.2.4")
        );
    }

    #[test]
    fn maxed_components_overflow_instead_of_wrapping() {
        let max = u64::MAX;
        for (current, part, component) in [
            (format!("{max}.0.0"), VersionPart::Major, "major"),
            (format!("1.{max}.0"), VersionPart::Minor, "minor"),
            (format!("1.2.{max}"), VersionPart::Patch, "patch"),
            (format!("1.2.{max}"), VersionPart::Prerelease, "patch"),
        ] {
            let err = next_version(&v(&current), part).unwrap_err();
            assert!(
                matches!(err, VersionError::Overflow { component: c, .. } if c == component),
                "{current} + {part}: {err}"
            );
        }
    }

    #[test]
    fn maxed_prerelease_identifier_overflows() {
        let current = v(&format!("1.2.3-{}", u64::MAX));
        let err = next_version(&current, VersionPart::Prerelease).unwrap_err();
        assert!(matches!(
            err,
            VersionError::Overflow {
                component: "prerelease",
                ..
            }
        ));
        assert!(err.to_string().contains("already at the maximum"));
    }
}
