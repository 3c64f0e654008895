//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the command handlers.
//!
//! Everything after the options is handed over untouched: the first trailing
//! argument names the restic command to run (`backup`, `snapshots`, …) and
//! the remainder is forwarded to restic verbatim.  Two command names are
//! intercepted by the launcher itself (`profiles` and `show`) — see `main`.

use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name    = "restic-wrap",
    about   = "A profile-driven launcher for restic",
    version,
    // Show a compact two-column help layout.
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Path or file name of the configuration file.
    ///
    /// A path that exists is used as-is.  A bare file name is searched in
    /// the current directory, the user configuration directory and the
    /// system locations.  Defaults to `profiles.toml` (with `profiles.conf`
    /// accepted as a legacy spelling).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Name of the profile (or group of profiles) to use.
    #[arg(short, long, default_value = "default")]
    pub name: String,

    /// Only print errors; also passes `--quiet` to restic.
    #[arg(short, long)]
    pub quiet: bool,

    /// Print debug output (config file used, assembled command lines); also
    /// passes `--verbose` to restic.  `--quiet` wins when both are given.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the assembled command line instead of running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Disable colours in the output.
    #[arg(long)]
    pub no_ansi: bool,

    /// restic command to run, followed by arguments passed through to restic.
    ///
    /// When no command is given, `default-command` from the `[global]`
    /// section applies (falling back to `snapshots`).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// The requested restic command, if one was given on the command line.
    pub fn command(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Arguments after the command, forwarded to restic verbatim.
    pub fn passthrough(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("restic-wrap").chain(extra.iter().copied()))
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.name, "default");
        assert!(cli.config.is_none());
        assert!(!cli.quiet && !cli.verbose && !cli.dry_run);
        assert!(cli.command().is_none());
        assert!(cli.passthrough().is_empty());
    }

    #[test]
    fn first_trailing_arg_is_the_command() {
        let cli = parse(&["-n", "home", "backup"]);
        assert_eq!(cli.name, "home");
        assert_eq!(cli.command(), Some("backup"));
        assert!(cli.passthrough().is_empty());
    }

    #[test]
    fn arguments_after_the_command_pass_through() {
        let cli = parse(&["backup", "--tag", "nightly", "/extra/path"]);
        assert_eq!(cli.command(), Some("backup"));
        assert_eq!(cli.passthrough(), ["--tag", "nightly", "/extra/path"]);
    }

    #[test]
    fn hyphen_values_after_the_command_are_not_parsed_as_options() {
        // --quiet here belongs to restic, not to the launcher.
        let cli = parse(&["snapshots", "--quiet"]);
        assert!(!cli.quiet);
        assert_eq!(cli.passthrough(), ["--quiet"]);
    }

    #[test]
    fn quiet_and_verbose_can_both_be_set() {
        // Precedence is decided where the flags are consumed, not here.
        let cli = parse(&["-q", "-v"]);
        assert!(cli.quiet);
        assert!(cli.verbose);
    }
}
