//! `restic-wrap show` — print the resolved profile.
//!
//! Handy for verifying what an `inherit` chain actually produces before
//! committing to a long backup run.

use anyhow::Result;

use crate::{config::Config, profile::Profile};

pub fn run(config: &Config, name: &str) -> Result<()> {
    let profile = Profile::resolve(config, name)?;
    println!("{profile:#?}");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
