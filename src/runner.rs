//! Command argument construction helpers.
//!
//! This module is responsible for *building* the argument lists that will be
//! passed to restic.  It deliberately does **not** execute anything — process
//! execution lives in [`crate::ui`] and [`crate::commands::run`].
//!
//! Keeping arg-building separate from execution means every function here is
//! pure (apart from the binary probe) and trivially unit-testable without
//! spawning any child processes.
//!
//! # Flag conversion
//!
//! Configuration keys become restic flags:
//!
//! | TOML                        | Command line                |
//! |-----------------------------|-----------------------------|
//! | `one-file-system = true`    | `--one-file-system`         |
//! | `one-file-system = false`   | (omitted)                   |
//! | `tag = "nightly"`           | `--tag nightly`             |
//! | `keep-daily = 7`            | `--keep-daily 7`            |
//! | `exclude = ["a", "b"]`      | `--exclude a --exclude b`   |
//! | `x = true` (one letter)     | `-x`                        |
//!
//! The `source` key of a command section is not a flag: its values are
//! emitted as trailing positional arguments (`restic backup <source>…`).

use std::path::Path;

use toml::{Table, Value};

use crate::{
    cli::Cli,
    config::Global,
    profile::{Profile, scalar_value},
};

/// The repository-creation command, run ahead of time when `initialize` is
/// set and used to suppress the pre-init when requested explicitly.
pub const COMMAND_INIT: &str = "init";

/// Key of a command section holding positional paths instead of a flag.
pub const KEY_SOURCE: &str = "source";

/// Directories probed for the restic binary when `[global]` has no override.
const BINARY_LOCATIONS: [&str; 3] = ["/usr/bin", "/usr/local/bin", "/opt/local/bin"];

// ─── Binary resolution ────────────────────────────────────────────────────────

/// Resolve the restic binary to launch.
///
/// Order: the `[global] restic-binary` override, the first hit among the
/// well-known locations, a `$PATH` lookup, and finally the bare name (letting
/// the OS report the failure at spawn time).
pub fn restic_binary(global: &Global) -> String {
    if let Some(binary) = &global.restic_binary {
        return binary.clone();
    }
    for location in BINARY_LOCATIONS {
        let candidate = Path::new(location).join("restic");
        if candidate.is_file() {
            return candidate.to_string_lossy().into_owned();
        }
    }
    which::which("restic")
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "restic".into())
}

// ─── Priority prefix ──────────────────────────────────────────────────────────

/// `nice`/`ionice` prefix from the `[global]` section, prepended to every
/// restic invocation.  Empty when neither is configured.
pub fn priority_prefix(global: &Global) -> Vec<String> {
    let mut prefix: Vec<String> = Vec::new();
    if let Some(level) = global.nice {
        prefix.extend(["nice".into(), "-n".into(), level.to_string()]);
    }
    if global.ionice {
        prefix.push("ionice".into());
        if let Some(class) = global.ionice_class {
            prefix.extend(["-c".into(), class.to_string()]);
        }
        if let Some(level) = global.ionice_level {
            prefix.extend(["-n".into(), level.to_string()]);
        }
    }
    prefix
}

// ─── Flag conversion ──────────────────────────────────────────────────────────

fn flag_name(key: &str) -> String {
    if key.chars().count() == 1 {
        format!("-{key}")
    } else {
        format!("--{key}")
    }
}

fn push_flag(args: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Boolean(true) => args.push(flag_name(key)),
        Value::Boolean(false) => {},
        Value::Array(items) => {
            for item in items {
                push_flag(args, key, item);
            }
        },
        // Nested tables have no flag equivalent.
        Value::Table(_) => {},
        other => {
            if let Some(text) = scalar_value(other) {
                args.push(flag_name(key));
                args.push(text);
            }
        },
    }
}

/// Convert a flag section into command-line arguments, in table order.
pub fn flag_args(section: &Table) -> Vec<String> {
    let mut args = Vec::new();
    for (key, value) in section {
        if key == KEY_SOURCE {
            continue;
        }
        push_flag(&mut args, key, value);
    }
    args
}

/// Positional paths from a command section's `source` key.
pub fn source_args(section: &Table) -> Vec<String> {
    match section.get(KEY_SOURCE) {
        Some(Value::String(path)) => vec![path.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(scalar_value).collect(),
        _ => Vec::new(),
    }
}

// ─── Argument builders ────────────────────────────────────────────────────────

/// Arguments shared by every invocation of `command` for this profile:
/// the command itself, `-r <repository>`, common flags, section flags.
fn base_args(profile: &Profile, command: &str) -> Vec<String> {
    let mut args = vec![command.to_string()];
    if let Some(repository) = &profile.repository {
        args.push("-r".into());
        args.push(repository.clone());
    }
    args.extend(flag_args(&profile.common));
    if let Some(section) = profile.command_section(command) {
        args.extend(flag_args(section));
    }
    args
}

/// Arguments for the ahead-of-time `restic init`.
pub fn build_init_args(profile: &Profile) -> Vec<String> {
    base_args(profile, COMMAND_INIT)
}

/// Arguments for the requested command: base arguments, the verbosity flag
/// (`--quiet` wins over `--verbose`), passthrough arguments, and finally the
/// positional `source` paths.
pub fn build_command_args(profile: &Profile, command: &str, cli: &Cli) -> Vec<String> {
    let mut args = base_args(profile, command);
    if cli.quiet {
        args.push("--quiet".into());
    } else if cli.verbose {
        args.push("--verbose".into());
    }
    args.extend(cli.passthrough().iter().cloned());
    if let Some(section) = profile.command_section(command) {
        args.extend(source_args(section));
    }
    args
}

/// The full command line: priority prefix, restic binary, then `args`.
pub fn full_command(global: &Global, args: Vec<String>) -> Vec<String> {
    let mut argv = priority_prefix(global);
    argv.push(restic_binary(global));
    argv.extend(args);
    argv
}

// ─── Tests ────────────────────────────────────────────────────────────────────
