//! `mockup diff <before> <after>`: additions between two registry snapshots.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use mockup_core::{RegistryDiff, RegistrySnapshot};

/// Arguments for `mockup diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Snapshot JSON taken before the bundle was loaded.
    pub before: PathBuf,

    /// Snapshot JSON taken after the bundle was loaded.
    pub after: PathBuf,

    /// Print the diff as JSON.
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let before = read_snapshot(&self.before)?;
        let after = read_snapshot(&self.after)?;
        let diff = mockup_core::diff(&before, &after);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&diff).context("failed to render diff JSON")?
            );
            return Ok(());
        }
        print_diff(&diff);
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<RegistrySnapshot> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a registry snapshot", path.display()))
}

fn print_diff(diff: &RegistryDiff) {
    if diff.is_empty() {
        println!("No additions.");
        return;
    }
    for group in &diff.new_groups {
        println!("{} group {group}", "+".green().bold());
        for preset in diff.new_presets.iter().filter(|p| &p.group == group) {
            println!("    {}", preset.preset);
        }
    }
    for preset in diff.presets_in_existing_groups() {
        println!("{} {} / {}", "+".green(), preset.group, preset.preset);
    }
}
