//! The launcher pipeline — runs for every command that belongs to restic.
//!
//! For a single profile the steps are:
//!
//! 1. Resolve the profile (inheritance applied) and check it has a
//!    repository.
//! 2. If `initialize` is set (globally or on the profile), attempt a
//!    `restic init` with captured output.  Failure is expected once the
//!    repository exists and is only surfaced with `--verbose`.
//! 3. Build the full command line and spawn restic with inherited stdio and
//!    the profile's environment variables.  restic's exit status becomes the
//!    launcher's exit code.
//!
//! When `--name` matches a group instead of a profile, the same steps run
//! once per member; the first non-zero restic status is kept as the final
//! exit code, but later members still get their turn.

use std::{collections::BTreeMap, process::Command};

use anyhow::{Context, Result};

use crate::{
    cli::Cli,
    config::{Config, Global},
    profile::{Profile, ProfileError},
    runner, ui,
    ui::Console,
};

// ─── Entry point ──────────────────────────────────────────────────────────────

/// Launch `cli`'s requested command for the named profile or group.
pub fn run(cli: &Cli, config: &Config, console: &Console) -> Result<i32> {
    let global = config.global();
    let command = cli.command().unwrap_or(global.default_command.as_str());

    let profiles: Vec<String> = if config.has_profile(&cli.name) {
        vec![cli.name.clone()]
    } else if let Some(members) = config.group(&cli.name) {
        console.debug(&format!(
            "running group '{}': {}",
            cli.name,
            members.join(", ")
        ));
        members.to_vec()
    } else {
        return Err(ProfileError::UnknownProfile(cli.name.clone()).into());
    };

    let mut exit_code = 0;
    for name in &profiles {
        let code = run_profile(cli, config, console, name, command)?;
        if code != 0 {
            console.warning(&format!("profile '{name}': restic exited with status {code}"));
            if exit_code == 0 {
                exit_code = code;
            }
        }
    }
    Ok(exit_code)
}

// ─── Single profile ───────────────────────────────────────────────────────────

fn run_profile(
    cli: &Cli,
    config: &Config,
    console: &Console,
    name: &str,
    command: &str,
) -> Result<i32> {
    let global = config.global();
    let profile = Profile::resolve(config, name)?;
    profile.require_repository()?;

    if (global.initialize || profile.initialize)
        && command != runner::COMMAND_INIT
        && !cli.dry_run
    {
        initialize_repository(global, &profile, console);
    }

    let argv = runner::full_command(global, runner::build_command_args(&profile, command, cli));
    let rendered = argv.join(" ");
    console.debug(&rendered);

    if cli.dry_run {
        println!("{rendered}");
        return Ok(0);
    }
    execute(&argv, &profile.env)
}

/// Attempt `restic init` ahead of the requested command.
///
/// The repository usually exists already, so the output is captured and the
/// failure only shows up with `--verbose`.
fn initialize_repository(global: &Global, profile: &Profile, console: &Console) {
    let argv = runner::full_command(global, runner::build_init_args(profile));
    console.debug(&argv.join(" "));
    let outcome = ui::run_stage("Init repository", &argv, &profile.env);
    if outcome.failed() {
        console.debug(&format!("repository init skipped: {}", outcome.detail()));
    }
}

// ─── Execution ────────────────────────────────────────────────────────────────

/// Spawn the command with inherited stdio and `env` added to the process
/// environment, returning its exit code.
fn execute(argv: &[String], env: &BTreeMap<String, String>) -> Result<i32> {
    let (program, args) = argv.split_first().context("cannot run an empty command")?;

    let status = Command::new(program)
        .args(args)
        .envs(env)
        .status()
        .with_context(|| format!("failed to run {program}"))?;

    // A child killed by a signal has no exit code; report plain failure.
    Ok(status.code().unwrap_or(1))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
