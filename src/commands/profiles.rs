//! `restic-wrap profiles` — list what the configuration file defines.
//!
//! Shows every profile with its description and the restic commands it
//! configures, followed by the groups.  Nothing is resolved here: the raw
//! tables are listed as written, so a profile with a broken `inherit` still
//! shows up (running it is when the error surfaces).

use console::style;
use toml::Value;

use crate::{config::Config, profile::SECTION_ENV};

pub fn run(config: &Config) {
    println!();
    println!(
        "{}",
        style(format!("Profiles in {}:", config.path().display())).bold()
    );

    for name in config.profile_names() {
        let Some(table) = config.profile(name) else {
            continue;
        };
        let description = table
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        println!("  {} {}", style(format!("{name:<16}")).cyan().bold(), description);

        let sections: Vec<&str> = table
            .iter()
            .filter(|(key, value)| value.is_table() && key.as_str() != SECTION_ENV)
            .map(|(key, _)| key.as_str())
            .collect();
        if !sections.is_empty() {
            println!(
                "  {:<16} {}",
                "",
                style(format!("commands: {}", sections.join(", "))).dim()
            );
        }
    }

    let groups = config.groups();
    if !groups.is_empty() {
        println!();
        println!("{}", style("Groups:").bold());
        for (name, members) in groups {
            println!(
                "  {} {}",
                style(format!("{name:<16}")).cyan().bold(),
                members.join(", ")
            );
        }
    }
    println!();
}

// ─── Tests ────────────────────────────────────────────────────────────────────
