//! Integration tests for the `restic-wrap` binary.
//!
//! These tests exercise the CLI layer end-to-end: they spawn the actual
//! compiled binary and assert on exit codes, stdout, and stderr.  restic is
//! **not** required — everything runs through `--dry-run`, the launcher's own
//! commands (`profiles`, `show`), and error paths that never reach a restic
//! invocation.
//!
//! # Running
//!
//! ```sh
//! cargo test --test integration
//! ```

use std::{fs, path::Path, process::Command};

/// Absolute path to the compiled `restic-wrap` binary, resolved at compile
/// time by Cargo.  This works correctly for both `cargo test` and `cargo test
/// --release` without any hardcoding.
const BIN: &str = env!("CARGO_BIN_EXE_restic-wrap");

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Run `restic-wrap` with `args` in the given working directory.
///
/// Returns `(exit_code, stdout, stderr)`.
fn run_in(args: &[&str], dir: &Path) -> (Option<i32>, String, String) {
    let out = Command::new(BIN)
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn {BIN}: {e}"));

    (
        out.status.code(),
        String::from_utf8_lossy(&out.stdout).into_owned(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
    )
}

/// A complete configuration used by most tests, written to `profiles.toml`
/// in a fresh temp directory.
fn write_fixture(dir: &Path) {
    fs::write(
        dir.join("profiles.toml"),
        r#"
[global]
restic-binary = "restic"

[groups]
all = ["home", "media"]

[default]
repository = "/backups/default"

[home]
description     = "Home directory backup"
repository      = "/backups/home"
one-file-system = true

[home.env]
restic_password = "hunter2"

[home.backup]
exclude = ["*.tmp"]
source  = ["/home/alice"]

[media]
inherit    = "home"
repository = "/backups/media"

[norepo]
one-file-system = true
"#,
    )
    .unwrap();
}

fn fixture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    dir
}

// ─── --help / --version ───────────────────────────────────────────────────────

#[test]
fn help_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_in(&["--help"], dir.path());
    assert_eq!(code, Some(0));
    assert!(stdout.contains("restic"), "help should mention restic");
}

#[test]
fn version_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_in(&["--version"], dir.path());
    assert_eq!(code, Some(0));
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn unknown_flag_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_in(&["--this-flag-does-not-exist"], dir.path());
    assert_ne!(code, Some(0));
}

// ─── Error paths (all exit 2) ─────────────────────────────────────────────────

#[test]
fn missing_config_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_in(&["--dry-run"], dir.path());
    assert_eq!(code, Some(2));
    assert!(
        stderr.contains("was not found"),
        "stderr should explain the missing config; got: {stderr}"
    );
}

#[test]
fn invalid_toml_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("profiles.toml"), "not valid toml ][[[").unwrap();

    let (code, _, stderr) = run_in(&["--dry-run"], dir.path());
    assert_eq!(code, Some(2));
    assert!(stderr.contains("cannot parse"), "got: {stderr}");
}

#[test]
fn unknown_profile_exits_two() {
    let dir = fixture_dir();
    let (code, _, stderr) = run_in(&["-n", "ghost", "--dry-run"], dir.path());
    assert_eq!(code, Some(2));
    assert!(stderr.contains("ghost"), "got: {stderr}");
    assert!(stderr.contains("not found"), "got: {stderr}");
}

#[test]
fn missing_repository_exits_two() {
    let dir = fixture_dir();
    let (code, _, stderr) = run_in(&["-n", "norepo", "--dry-run"], dir.path());
    assert_eq!(code, Some(2));
    assert!(stderr.contains("repository"), "got: {stderr}");
}

// ─── --dry-run command assembly ───────────────────────────────────────────────

#[test]
fn dry_run_uses_the_default_command() {
    let dir = fixture_dir();
    let (code, stdout, _) = run_in(&["--dry-run"], dir.path());
    assert_eq!(code, Some(0));
    assert!(
        stdout.contains("restic snapshots -r /backups/default"),
        "got: {stdout}"
    );
}

#[test]
fn dry_run_builds_the_full_backup_command() {
    let dir = fixture_dir();
    let (code, stdout, _) = run_in(
        &["-n", "home", "--dry-run", "backup", "--tag", "nightly"],
        dir.path(),
    );
    assert_eq!(code, Some(0));
    assert!(
        stdout.contains(
            "restic backup -r /backups/home --one-file-system --exclude *.tmp --tag nightly /home/alice"
        ),
        "got: {stdout}"
    );
}

#[test]
fn dry_run_quiet_appends_the_quiet_flag() {
    let dir = fixture_dir();
    let (code, stdout, _) = run_in(&["-q", "--dry-run"], dir.path());
    assert_eq!(code, Some(0));
    assert!(stdout.contains("--quiet"), "got: {stdout}");
}

#[test]
fn inherited_profile_keeps_parent_flags_and_overrides_the_repository() {
    let dir = fixture_dir();
    let (code, stdout, _) = run_in(&["-n", "media", "--dry-run", "backup"], dir.path());
    assert_eq!(code, Some(0));
    assert!(stdout.contains("-r /backups/media"), "got: {stdout}");
    assert!(stdout.contains("--one-file-system"), "got: {stdout}");
    assert!(stdout.contains("/home/alice"), "got: {stdout}");
}

#[test]
fn group_runs_every_member_in_order() {
    let dir = fixture_dir();
    let (code, stdout, _) = run_in(&["-n", "all", "--dry-run"], dir.path());
    assert_eq!(code, Some(0));
    let home = stdout.find("/backups/home").expect("home member missing");
    let media = stdout.find("/backups/media").expect("media member missing");
    assert!(home < media, "group members should run in file order");
}

#[test]
fn verbose_names_the_configuration_file() {
    let dir = fixture_dir();
    let (code, stdout, _) = run_in(&["-v", "--dry-run"], dir.path());
    assert_eq!(code, Some(0));
    assert!(stdout.contains("using configuration file"), "got: {stdout}");
}

// ─── --config flag ────────────────────────────────────────────────────────────

#[test]
fn config_flag_reads_the_specified_file() {
    let dir = tempfile::tempdir().unwrap();
    let custom = dir.path().join("custom.toml");
    fs::write(
        &custom,
        "[global]\nrestic-binary = \"restic\"\n\n[default]\nrepository = \"/backups/custom\"\n",
    )
    .unwrap();

    let (code, stdout, _) = run_in(
        &["--config", custom.to_str().unwrap(), "--dry-run"],
        dir.path(),
    );
    assert_eq!(code, Some(0));
    assert!(stdout.contains("/backups/custom"), "got: {stdout}");
}

#[test]
fn legacy_conf_name_is_found() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("profiles.conf"),
        "[global]\nrestic-binary = \"restic\"\n\n[default]\nrepository = \"/backups/legacy\"\n",
    )
    .unwrap();

    let (code, stdout, _) = run_in(&["--dry-run"], dir.path());
    assert_eq!(code, Some(0));
    assert!(stdout.contains("/backups/legacy"), "got: {stdout}");
}

// ─── Own commands ─────────────────────────────────────────────────────────────

#[test]
fn profiles_lists_profiles_and_groups() {
    let dir = fixture_dir();
    let (code, stdout, _) = run_in(&["profiles"], dir.path());
    assert_eq!(code, Some(0));
    assert!(stdout.contains("home"), "got: {stdout}");
    assert!(stdout.contains("media"), "got: {stdout}");
    assert!(stdout.contains("Home directory backup"), "got: {stdout}");
    assert!(stdout.contains("commands: backup"), "got: {stdout}");
    assert!(stdout.contains("Groups"), "got: {stdout}");
    assert!(stdout.contains("all"), "got: {stdout}");
}

#[test]
fn show_prints_the_resolved_profile() {
    let dir = fixture_dir();
    let (code, stdout, _) = run_in(&["-n", "media", "show"], dir.path());
    assert_eq!(code, Some(0));
    // Repository overridden by the child, flag inherited from the parent.
    assert!(stdout.contains("/backups/media"), "got: {stdout}");
    assert!(stdout.contains("one-file-system"), "got: {stdout}");
}

#[test]
fn show_of_an_unknown_profile_exits_two() {
    let dir = fixture_dir();
    let (code, _, stderr) = run_in(&["-n", "ghost", "show"], dir.path());
    assert_eq!(code, Some(2));
    assert!(stderr.contains("ghost"), "got: {stderr}");
}
