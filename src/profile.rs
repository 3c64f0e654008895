//! Profile resolution.
//!
//! A profile is a named view over the configuration.  Resolving one walks the
//! `inherit` chain (child first), deep-merges the tables so that a child
//! overrides its parent only for the keys it actually sets, then splits the
//! merged table into the pieces the launcher cares about:
//!
//! - reserved keys (`inherit`, `description`, `repository`, `password-file`,
//!   `initialize`, `env`) are extracted into fields;
//! - remaining nested tables are per-command flag sections (`[home.backup]`);
//! - remaining scalars and arrays are common flags applied to every command.
//!
//! Turning the flag tables into actual `--flag value` strings lives in
//! [`crate::runner`]; this module owns merging only.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use thiserror::Error;
use toml::{Table, Value};

use crate::config::Config;

// ─── Reserved keys ────────────────────────────────────────────────────────────

const KEY_INHERIT: &str = "inherit";
const KEY_DESCRIPTION: &str = "description";
const KEY_REPOSITORY: &str = "repository";
const KEY_PASSWORD_FILE: &str = "password-file";
const KEY_INITIALIZE: &str = "initialize";

/// Name of the per-profile environment variable section.
pub(crate) const SECTION_ENV: &str = "env";

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Everything that can go wrong while resolving a profile.
///
/// All of these terminate the launcher with exit code 2.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile '{0}' was not found in the configuration")]
    UnknownProfile(String),

    #[error("profile '{profile}': parent profile '{parent}' not found")]
    UnknownParent { profile: String, parent: String },

    #[error("inheritance loop detected while resolving profile '{0}'")]
    InheritanceLoop(String),

    #[error("environment variable '{0}' must be a scalar value")]
    InvalidEnvValue(String),

    #[error("profile '{0}' does not define a repository")]
    MissingRepository(String),
}

// ─── Profile ──────────────────────────────────────────────────────────────────

/// A fully resolved profile: inheritance applied, reserved keys extracted.
#[derive(Debug)]
pub struct Profile {
    pub name: String,

    /// Free-text description.  Never inherited from a parent profile.
    pub description: Option<String>,

    /// Repository location, passed to restic as `-r`.
    pub repository: Option<String>,

    /// Attempt a `restic init` before running the requested command.
    pub initialize: bool,

    /// Flags applied to every restic command, in file order.
    pub common: Table,

    /// Per-command flag sections, keyed by restic command name.
    pub commands: Table,

    /// Environment variables for the subprocess.  Names are upper-cased.
    pub env: BTreeMap<String, String>,
}

impl Profile {
    /// Resolve `name` from the configuration, following `inherit` chains.
    pub fn resolve(config: &Config, name: &str) -> Result<Self, ProfileError> {
        // Collect the chain child-first, bailing out on unknown names and
        // inheritance loops.
        let mut chain: Vec<&Table> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = name;
        loop {
            let table = config.profile(current).ok_or_else(|| {
                if chain.is_empty() {
                    ProfileError::UnknownProfile(current.to_string())
                } else {
                    ProfileError::UnknownParent {
                        profile: name.to_string(),
                        parent: current.to_string(),
                    }
                }
            })?;
            if !seen.insert(current) {
                return Err(ProfileError::InheritanceLoop(name.to_string()));
            }
            chain.push(table);
            match table.get(KEY_INHERIT).and_then(Value::as_str) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Merge root ancestor first so children win on collision.
        let mut merged = Table::new();
        for table in chain.iter().rev() {
            merge_into(&mut merged, table);
        }

        // The description is the one field that is not inherited.
        let own_description = chain
            .first()
            .and_then(|table| table.get(KEY_DESCRIPTION))
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut profile = Self::from_table(name, merged, &config.dir())?;
        profile.description = own_description;
        Ok(profile)
    }

    /// Split a merged profile table into reserved fields, common flags and
    /// per-command sections.
    fn from_table(name: &str, merged: Table, config_dir: &Path) -> Result<Self, ProfileError> {
        let mut profile = Self {
            name: name.to_string(),
            description: None,
            repository: None,
            initialize: false,
            common: Table::new(),
            commands: Table::new(),
            env: BTreeMap::new(),
        };

        for (key, value) in merged {
            if key == KEY_INHERIT || key == KEY_DESCRIPTION {
                continue;
            }
            if key == KEY_REPOSITORY {
                if let Value::String(repository) = value {
                    profile.repository = Some(repository);
                }
                continue;
            }
            if key == KEY_INITIALIZE {
                if let Value::Boolean(flag) = value {
                    profile.initialize = flag;
                }
                continue;
            }
            if key == KEY_PASSWORD_FILE {
                if let Value::String(file) = value {
                    profile
                        .common
                        .insert(key, Value::String(resolve_relative(config_dir, &file)));
                }
                continue;
            }
            if key == SECTION_ENV {
                if let Value::Table(section) = value {
                    profile.env = parse_env(section)?;
                }
                continue;
            }
            match value {
                Value::Table(section) => {
                    profile.commands.insert(key, Value::Table(section));
                },
                other => {
                    profile.common.insert(key, other);
                },
            }
        }

        Ok(profile)
    }

    /// The flag section for `command`, if the profile defines one.
    pub fn command_section(&self, command: &str) -> Option<&Table> {
        self.commands.get(command).and_then(Value::as_table)
    }

    /// The repository, or the error shown when the configuration lacks one.
    pub fn require_repository(&self) -> Result<&str, ProfileError> {
        self.repository
            .as_deref()
            .ok_or_else(|| ProfileError::MissingRepository(self.name.clone()))
    }
}

// ─── Merging ──────────────────────────────────────────────────────────────────

/// Deep merge: `overlay` wins on scalar collision, nested tables merge
/// per-key.  Keys already in `base` keep their position, so flag order stays
/// stable across inheritance.
fn merge_into(base: &mut Table, overlay: &Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Table(existing)), Value::Table(section)) => {
                merge_into(existing, section);
            },
            _ => {
                base.insert(key.clone(), value.clone());
            },
        }
    }
}

// ─── Values ───────────────────────────────────────────────────────────────────

/// Render a scalar TOML value as the string restic will see.
///
/// Arrays and tables have no single-string rendering and return `None`.
pub(crate) fn scalar_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Integer(number) => Some(number.to_string()),
        Value::Float(number) => Some(number.to_string()),
        Value::Boolean(flag) => Some(flag.to_string()),
        Value::Datetime(datetime) => Some(datetime.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

fn parse_env(section: Table) -> Result<BTreeMap<String, String>, ProfileError> {
    let mut env = BTreeMap::new();
    for (key, value) in section {
        let text = scalar_value(&value).ok_or_else(|| ProfileError::InvalidEnvValue(key.clone()))?;
        env.insert(key.to_uppercase(), text);
    }
    Ok(env)
}

fn resolve_relative(root: &Path, file: &str) -> String {
    let path = Path::new(file);
    if path.is_absolute() {
        file.to_string()
    } else {
        root.join(path).to_string_lossy().into_owned()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
