//! `restic-wrap` — a profile-driven launcher for [restic](https://restic.net).
//!
//! # Overview
//!
//! This binary is a thin configuration-to-command-line layer around restic.
//! It replaces a family of hand-edited backup scripts with one tool: describe
//! each backup target as a profile in `profiles.toml`, then run
//! `restic-wrap -n <profile> <command>`.  The launcher resolves the profile
//! (inheritance and the `[global]` section included), turns it into restic
//! flags and environment variables, and shells out.  Backup, deduplication,
//! encryption and storage are restic's business, never ours.
//!
//! # Usage
//!
//! ```text
//! restic-wrap                      # default command ('snapshots') on the 'default' profile
//! restic-wrap -n home backup      # run 'backup' with the 'home' profile
//! restic-wrap -n home backup --tag nightly   # extra args go to restic verbatim
//! restic-wrap -n all check        # 'all' may name a [groups] entry
//! restic-wrap profiles            # list profiles and groups
//! restic-wrap -n home show        # print the resolved profile
//! restic-wrap --dry-run -n home backup       # print the command line, run nothing
//! ```
//!
//! # Module layout
//!
//! | Module                  | Responsibility                               |
//! |-------------------------|----------------------------------------------|
//! | [`cli`]                 | Argument types parsed by clap                |
//! | [`config`]              | Config file discovery + TOML loading         |
//! | [`profile`]             | Profile resolution (inheritance, env)        |
//! | [`runner`]              | Argument construction helpers                |
//! | [`ui`]                  | Console verbosity, spinner, captured exec    |
//! | [`commands::run`]       | Launch restic for a profile or group         |
//! | [`commands::profiles`]  | `profiles` listing                           |
//! | [`commands::show`]      | `show` resolved-profile dump                 |

mod cli;
mod commands;
mod config;
mod profile;
mod runner;
mod ui;

use std::process;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;
use ui::Console;

/// Fixed exit code for every launcher-side error (config not found, parse
/// error, unknown profile, missing repository, spawn failure).  restic's own
/// failures keep restic's exit code.
const EXIT_CONFIG_ERROR: i32 = 2;

/// Trailing commands handled by the launcher itself instead of restic.
const OWN_COMMAND_PROFILES: &str = "profiles";
const OWN_COMMAND_SHOW: &str = "show";

fn main() {
    let cli = Cli::parse();

    if cli.no_ansi {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
    let console = Console::new(cli.quiet, cli.verbose);

    match run(&cli, &console) {
        Ok(code) => process::exit(code),
        Err(err) => {
            console.error(&format!("{err:#}"));
            process::exit(EXIT_CONFIG_ERROR);
        },
    }
}

fn run(cli: &Cli, console: &Console) -> Result<i32> {
    let path = config::find_config_file(cli.config.as_deref())?;
    console.debug(&format!("using configuration file {}", path.display()));
    let config = Config::load(&path)?;

    match cli.command() {
        Some(OWN_COMMAND_PROFILES) => {
            commands::profiles::run(&config);
            Ok(0)
        },
        Some(OWN_COMMAND_SHOW) => {
            commands::show::run(&config, &cli.name)?;
            Ok(0)
        },
        _ => commands::run::run(cli, &config, console),
    }
}
