//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective. Tests that
//! need a real repository are skipped when `git` is not installed.

use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Like [`cmd`], with git identity and config isolated from the host.
fn cmd_in(dir: &Path) -> Command {
    let mut c = cmd();
    c.current_dir(dir)
        .env("BUMPRC_LOG_DIR", dir.join(".logs"))
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", dir.join(".gitconfig-empty"))
        .env("GIT_AUTHOR_NAME", "bumprc")
        .env("GIT_AUTHOR_EMAIL", "bumprc@example.com")
        .env("GIT_COMMITTER_NAME", "bumprc")
        .env("GIT_COMMITTER_EMAIL", "bumprc@example.com");
    c
}

fn git(dir: &Path, args: &[&str]) -> Option<String> {
    let out = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", dir.join(".gitconfig-empty"))
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).to_string())
}

/// An empty repository on branch `develop`, or `None` without git.
fn git_repo() -> Option<TempDir> {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(".gitconfig-empty"), "").unwrap();
    std::fs::write(tmp.path().join(".gitignore"), ".logs/\n.gitconfig-empty\n").unwrap();
    git(tmp.path(), &["init", "--quiet"])?;
    git(tmp.path(), &["checkout", "--quiet", "-b", "develop"])?;
    Some(tmp)
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("bump"))
        .stdout(predicate::str::contains("release"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn bump_help_lists_options() {
    cmd()
        .args(["bump", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--from-branch"))
        .stdout(predicate::str::contains("--semver-part"))
        .stdout(predicate::str::contains("--package-json"))
        .stdout(predicate::str::contains("--semver-file"))
        .stdout(predicate::str::contains("--auto-push-remote"))
        .stdout(predicate::str::contains("--remote"))
        .stdout(predicate::str::contains("--debug"));
}

#[test]
fn release_help_lists_suffix() {
    cmd()
        .args(["release", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--rc-branch-suffix"));
}

#[test]
fn rc_alias_is_accepted() {
    cmd().args(["rc", "--help"]).assert().success();
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn invalid_arguments_are_all_reported() {
    let tmp = TempDir::new().unwrap();
    cmd_in(tmp.path())
        .args(["bump", "-b", "x", "-s", "huge", "--semver", "1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--from-branch"))
        .stderr(predicate::str::contains("--semver-part"))
        .stderr(predicate::str::contains("--semver:"));
}

#[test]
fn branch_with_slash_is_rejected() {
    let tmp = TempDir::new().unwrap();
    cmd_in(tmp.path())
        .args(["release", "-b", "feature/login"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("doesn't match pattern"));
}

// =============================================================================
// Bump
// =============================================================================

#[test]
fn bump_without_any_version_fails() {
    let Some(repo) = git_repo() else { return };

    cmd_in(repo.path())
        .args(["bump", "--semver-file", "VERSION"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no semver found"));

    assert!(!repo.path().join("VERSION").exists());
}

#[test]
fn bump_updates_version_file_commits_and_tags() {
    let Some(repo) = git_repo() else { return };
    std::fs::write(repo.path().join("VERSION"), "1.2.3\n").unwrap();

    cmd_in(repo.path())
        .args(["--color", "never", "bump", "--semver-file", "VERSION"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.4"))
        .stdout(predicate::str::contains("skipped: auto-push remote is not set"));

    assert_eq!(
        std::fs::read_to_string(repo.path().join("VERSION")).unwrap(),
        "1.2.4\n"
    );
    let tags = git(repo.path(), &["tag", "--list"]).unwrap();
    assert!(tags.lines().any(|t| t == "1.2.4"), "tags: {tags}");
    let log = git(repo.path(), &["log", "-1", "--format=%s"]).unwrap();
    assert_eq!(log.trim(), "Version - Bumped version to 1.2.4.");
}

#[test]
fn bump_json_outputs_outcome() {
    let Some(repo) = git_repo() else { return };
    std::fs::write(
        repo.path().join("package.json"),
        "{\n  \"name\": \"app\",\n  \"version\": \"0.3.0\"\n}\n",
    )
    .unwrap();

    let output = cmd_in(repo.path())
        .args(["--json", "bump", "-p", "package.json", "-s", "minor"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("--json should output valid JSON");
    assert_eq!(json["workflow"], "bump");
    assert_eq!(json["previous"], "0.3.0");
    assert_eq!(json["version"], "0.4.0");
    assert_eq!(json["source"], "manifest");
    assert_eq!(json["touched_files"][0], "package.json");
}

#[test]
fn malformed_manifest_fails() {
    let Some(repo) = git_repo() else { return };
    std::fs::write(repo.path().join("package.json"), "{ nope").unwrap();

    cmd_in(repo.path())
        .args(["bump", "--semver", "1.0.0", "-p", "package.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn push_failure_does_not_fail_the_run() {
    let Some(repo) = git_repo() else { return };
    std::fs::write(repo.path().join("VERSION"), "2.0.0\n").unwrap();

    cmd_in(repo.path())
        .args([
            "--color",
            "never",
            "bump",
            "--semver-file",
            "VERSION",
            "--remote",
            "nowhere",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("✗"))
        .stdout(predicate::str::contains("push tags"));
}

// =============================================================================
// Release
// =============================================================================

#[test]
fn release_creates_candidate_branch() {
    let Some(repo) = git_repo() else { return };
    std::fs::write(repo.path().join("VERSION"), "1.2.9\n").unwrap();

    cmd_in(repo.path())
        .args(["rc", "--semver-file", "VERSION", "-s", "minor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.3.0_Release_Candidate"));

    let branch = git(repo.path(), &["rev-parse", "--abbrev-ref", "HEAD"]).unwrap();
    assert_eq!(branch.trim(), "1.3.0_Release_Candidate");
    let log = git(repo.path(), &["log", "-1", "--format=%s"]).unwrap();
    assert_eq!(log.trim(), "rc-version - Repo version upgraded to 1.3.0.");
}

#[test]
fn release_suffix_from_flag() {
    let Some(repo) = git_repo() else { return };
    std::fs::write(repo.path().join("VERSION"), "0.1.0\n").unwrap();

    cmd_in(repo.path())
        .args([
            "release",
            "--semver-file",
            "VERSION",
            "--rc-branch-suffix",
            "-rc",
        ])
        .assert()
        .success();

    let branch = git(repo.path(), &["rev-parse", "--abbrev-ref", "HEAD"]).unwrap();
    assert_eq!(branch.trim(), "0.1.1-rc");
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_suppresses_step_lines() {
    let Some(repo) = git_repo() else { return };
    std::fs::write(repo.path().join("VERSION"), "1.0.0\n").unwrap();

    cmd_in(repo.path())
        .args(["-q", "bump", "--semver-file", "VERSION"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓").not())
        .stdout(predicate::str::contains("1.0.1"));
}

#[test]
fn verbose_and_debug_flags_accepted() {
    let tmp = TempDir::new().unwrap();
    // Fails validation either way; only flag parsing is under test.
    cmd_in(tmp.path())
        .args(["-vv", "bump", "--debug", "-s", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--semver-part"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "bump"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to change directory"));
}
