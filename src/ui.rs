//! Terminal output and captured subprocess execution.
//!
//! # Design goals
//!
//! - **Quiet by default.** [`Console`] gates everything on the verbosity
//!   flags: debug lines appear only with `--verbose`, warnings are suppressed
//!   by `--quiet`, errors always print.
//! - **restic owns the terminal.** The requested command runs with inherited
//!   stdio (see [`crate::commands::run`]).  Only the ahead-of-time
//!   `restic init` runs here, behind a spinner with captured output, because
//!   its failure chatter ("repository already exists") is noise.
//! - **Testable without a terminal.** [`StageOutcome`] is a plain data type
//!   and [`run_captured`] buffers everything.

use std::{
    collections::BTreeMap,
    process::{Command, Output, Stdio},
    time::Duration,
};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

// ─── Console ──────────────────────────────────────────────────────────────────

/// Verbosity-aware message sink.  `--quiet` wins over `--verbose`.
pub struct Console {
    quiet: bool,
    verbose: bool,
}

impl Console {
    pub const fn new(quiet: bool, verbose: bool) -> Self {
        Self { quiet, verbose }
    }

    /// Dim diagnostic line, shown only with `--verbose`.
    pub fn debug(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{}", style(message).dim());
        }
    }

    /// Warning to stderr, suppressed by `--quiet`.
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("Warning:").yellow().bold(), message);
        }
    }

    /// Error to stderr.  Always shown.
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("Error:").red().bold(), message);
    }
}

// ─── Stage result ─────────────────────────────────────────────────────────────

/// The outcome of a captured stage.
///
/// Carries whatever the command wrote to stdout/stderr so callers can decide
/// what (if anything) to surface.
#[derive(Debug)]
pub struct StageOutcome {
    /// Human-readable stage label, e.g. `"Init repository"`.
    pub label: String,
    /// Whether the stage completed without error.
    pub success: bool,
    /// Everything the command wrote to stdout.
    pub stdout: String,
    /// Everything the command wrote to stderr.
    pub stderr: String,
    /// The spawn/launch error message, if any.
    pub error: Option<String>,
}

impl StageOutcome {
    /// Returns `true` if the stage did not succeed.
    pub const fn failed(&self) -> bool {
        !self.success
    }

    /// One line of detail for debug logging: the launch error when there is
    /// one, otherwise the last line the command wrote (stderr preferred).
    pub fn detail(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }
        if let Some(line) = self.stderr.lines().last() {
            return line.to_string();
        }
        self.stdout.lines().last().unwrap_or_default().to_string()
    }
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Braille spinner frames — same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create and start an indeterminate spinner for `label`.
fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan}  {msg}")
            .unwrap()
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Captured execution ───────────────────────────────────────────────────────

/// Run a command with `env` added to the environment, capturing both stdout
/// and stderr.
///
/// Returns `(success, stdout_text, stderr_text)`.
pub fn run_captured(
    args: &[String],
    env: &BTreeMap<String, String>,
) -> Result<(bool, String, String)> {
    let (program, rest) = args.split_first().context("cannot run an empty command")?;

    let output: Output = Command::new(program)
        .args(rest)
        .envs(env)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("failed to spawn: {}", args.join(" ")))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    Ok((output.status.success(), stdout, stderr))
}

/// Run a stage behind a spinner, returning a [`StageOutcome`].
///
/// The spinner is cleared before returning so the terminal is clean whatever
/// the caller decides to print.
pub fn run_stage(label: &str, args: &[String], env: &BTreeMap<String, String>) -> StageOutcome {
    let spinner = make_spinner(label);

    let result = run_captured(args, env);
    spinner.finish_and_clear();

    match result {
        Ok((success, stdout, stderr)) => StageOutcome {
            label: label.to_string(),
            success,
            stdout,
            stderr,
            error: None,
        },
        Err(e) => StageOutcome {
            label: label.to_string(),
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(e.to_string()),
        },
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    // ── run_captured ─────────────────────────────────────────────────────────

    #[test]
    fn run_captured_true_succeeds() {
        let (ok, _out, _err) = run_captured(&["true".into()], &no_env()).unwrap();
        assert!(ok);
    }

    #[test]
    fn run_captured_false_fails() {
        let (ok, _out, _err) = run_captured(&["false".into()], &no_env()).unwrap();
        assert!(!ok);
    }

    #[test]
    fn run_captured_captures_stdout() {
        let (ok, out, _err) =
            run_captured(&["sh".into(), "-c".into(), "echo hello".into()], &no_env()).unwrap();
        assert!(ok);
        assert!(out.contains("hello"));
    }

    #[test]
    fn run_captured_captures_stderr() {
        let (ok, _out, err) =
            run_captured(&["sh".into(), "-c".into(), "echo oops >&2".into()], &no_env()).unwrap();
        assert!(ok);
        assert!(err.contains("oops"));
    }

    #[test]
    fn run_captured_passes_environment() {
        let mut env = BTreeMap::new();
        env.insert("WRAP_TEST_VAR".to_string(), "wrapped".to_string());
        let (ok, out, _err) = run_captured(
            &["sh".into(), "-c".into(), "printf %s \"$WRAP_TEST_VAR\"".into()],
            &env,
        )
        .unwrap();
        assert!(ok);
        assert_eq!(out, "wrapped");
    }

    #[test]
    fn run_captured_empty_args_errors() {
        assert!(run_captured(&[], &no_env()).is_err());
    }

    // ── run_stage ────────────────────────────────────────────────────────────

    #[test]
    fn run_stage_success() {
        let outcome = run_stage("Test", &["true".into()], &no_env());
        assert!(outcome.success);
        assert_eq!(outcome.label, "Test");
        assert!(outcome.error.is_none());
    }

    #[test]
    fn run_stage_failure_captures_output() {
        let outcome = run_stage(
            "Test",
            &["sh".into(), "-c".into(), "echo bad >&2; exit 1".into()],
            &no_env(),
        );
        assert!(outcome.failed());
        assert_eq!(outcome.detail(), "bad");
    }

    #[test]
    fn run_stage_spawn_error_is_reported() {
        let outcome = run_stage("Test", &["/nonexistent/binary-xyz".into()], &no_env());
        assert!(outcome.failed());
        assert!(outcome.error.is_some());
        assert!(!outcome.detail().is_empty());
    }

    // ── Console ──────────────────────────────────────────────────────────────

    #[test]
    fn console_smoke() {
        // These only print; the assertions are that nothing panics under any
        // verbosity combination.
        for (quiet, verbose) in [(false, false), (true, false), (false, true), (true, true)] {
            let console = Console::new(quiet, verbose);
            console.debug("debug line");
            console.warning("warning line");
            console.error("error line");
        }
    }
}
