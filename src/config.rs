//! Configuration discovery and loading.
//!
//! The configuration file is a TOML document whose top-level tables are
//! profiles, with two reserved sections:
//!
//! ```toml
//! [global]
//! default-command = "snapshots"
//! restic-binary   = "/opt/restic/restic"
//! nice            = 10
//!
//! [groups]
//! all = ["home", "media"]
//!
//! [home]
//! repository      = "/backups/home"
//! password-file   = "key"        # relative to this file
//! one-file-system = true
//!
//! [home.env]
//! restic_cache_dir = "/var/cache/restic"
//!
//! [home.backup]
//! exclude = ["*.tmp", ".cache"]
//! source  = ["/home/alice"]
//!
//! [media]
//! inherit    = "home"
//! repository = "/backups/media"
//! ```
//!
//! This module only finds, parses and slices the document; turning a profile
//! table into flags and environment variables is [`crate::profile`]'s job.
//! Key order inside tables is preserved so that flag order follows the file.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use toml::{Table, Value};

// ─── Defaults ─────────────────────────────────────────────────────────────────

/// Primary configuration file name.
pub const DEFAULT_CONFIG_NAME: &str = "profiles.toml";

/// Legacy spelling; a `.conf` file is still parsed as TOML.
pub const LEGACY_CONFIG_NAME: &str = "profiles.conf";

/// Directory name used under the user/system configuration directories.
const APP_DIR: &str = "restic-wrap";

/// restic command run when none is given on the command line or in `[global]`.
pub const DEFAULT_COMMAND: &str = "snapshots";

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Everything that can go wrong before a profile is even resolved.
///
/// All of these terminate the launcher with exit code 2.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file '{name}' was not found in any of: {searched}")]
    NotFound { name: String, searched: String },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ─── [global] ─────────────────────────────────────────────────────────────────

/// Launcher-level settings from the `[global]` section.
///
/// Everything is optional; an absent section behaves like an empty one.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Global {
    /// restic command used when none is given on the command line.
    pub default_command: String,

    /// Attempt a `restic init` before running the requested command.
    pub initialize: bool,

    /// Path to the restic binary.  When unset, the well-known locations are
    /// probed and `$PATH` is searched (see [`crate::runner::restic_binary`]).
    pub restic_binary: Option<String>,

    /// CPU priority: the command line is prefixed with `nice -n <n>`.
    pub nice: Option<i32>,

    /// I/O priority: the command line is prefixed with `ionice`.
    pub ionice: bool,

    /// `ionice` scheduling class (`-c`), only used when `ionice` is set.
    pub ionice_class: Option<u8>,

    /// `ionice` class level (`-n`), only used when `ionice` is set.
    pub ionice_level: Option<u8>,
}

impl Default for Global {
    fn default() -> Self {
        Self {
            default_command: DEFAULT_COMMAND.into(),
            initialize: false,
            restic_binary: None,
            nice: None,
            ionice: false,
            ionice_class: None,
            ionice_level: None,
        }
    }
}

// ─── Document ─────────────────────────────────────────────────────────────────

/// Raw shape of the configuration file: the two reserved sections, plus
/// every remaining top-level table as a profile.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    global: Global,

    #[serde(default)]
    groups: BTreeMap<String, Vec<String>>,

    #[serde(flatten)]
    rest: Table,
}

/// A parsed configuration file.
#[derive(Debug)]
pub struct Config {
    path: PathBuf,
    global: Global,
    groups: BTreeMap<String, Vec<String>>,
    profiles: Table,
}

impl Config {
    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&text, path)
    }

    /// Parse a configuration document, recording `path` as its origin.
    ///
    /// The origin matters beyond error messages: file entries such as
    /// `password-file` are resolved relative to it.
    pub fn from_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        // Stray top-level scalars are not profiles; drop them.
        let profiles = raw
            .rest
            .into_iter()
            .filter(|(_, value)| value.is_table())
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            global: raw.global,
            groups: raw.groups,
            profiles,
        })
    }

    /// The `[global]` section (defaulted when absent).
    pub fn global(&self) -> &Global {
        &self.global
    }

    /// All groups from the `[groups]` section.
    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    /// Member profiles of a group, if the group exists.
    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn has_profile(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// The raw (unresolved) table of a profile.
    pub fn profile(&self, name: &str) -> Option<&Table> {
        self.profiles.get(name).and_then(Value::as_table)
    }

    /// Profile names in file order.
    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Path of the file this configuration was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory of the configuration file.  Relative file entries in the
    /// configuration are resolved against this, not the working directory.
    pub fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

// ─── File search ──────────────────────────────────────────────────────────────

/// Directories searched for a configuration file, in order.
fn search_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(".")];
    if let Some(config_dir) = dirs::config_dir() {
        locations.push(config_dir.join(APP_DIR));
    }
    locations.push(PathBuf::from("/usr/local/etc").join(APP_DIR));
    locations.push(PathBuf::from("/etc").join(APP_DIR));
    locations
}

fn search_by_name(names: &[&str]) -> Option<PathBuf> {
    for location in search_locations() {
        for name in names {
            let candidate = location.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn not_found(name: &str) -> ConfigError {
    let searched = search_locations()
        .iter()
        .map(|l| l.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    ConfigError::NotFound {
        name: name.to_string(),
        searched,
    }
}

/// Locate the configuration file.
///
/// - An explicit path that exists is used verbatim.
/// - An explicit bare file name is searched across the default locations.
/// - With no explicit path, `profiles.toml` then `profiles.conf` are searched
///   in the current directory, the user configuration directory, and the
///   system locations.
pub fn find_config_file(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => {
            let name = path.display().to_string();
            // A bare file name may still live in one of the search locations.
            if path.parent() == Some(Path::new("")) {
                if let Some(found) = search_by_name(&[name.as_str()]) {
                    return Ok(found);
                }
            }
            Err(not_found(&name))
        },
        None => search_by_name(&[DEFAULT_CONFIG_NAME, LEGACY_CONFIG_NAME])
            .ok_or_else(|| not_found(DEFAULT_CONFIG_NAME)),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
