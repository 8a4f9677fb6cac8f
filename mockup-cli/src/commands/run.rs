//! `mockup run`: composite a shirt into a model document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use mockup_bridge::{tasks, Bridge};
use mockup_core::{CompositeRequest, HexColor, PrintDirection};

/// Arguments for `mockup run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Model document (PSD) holding the shirt layer.
    #[arg(long)]
    pub model: PathBuf,

    /// Image placed into the shirt layer.
    #[arg(long)]
    pub shirt: PathBuf,

    /// Preset bundle to load before playing the preset.
    #[arg(long)]
    pub bundle: Option<PathBuf>,

    /// Preset (action) to play.
    #[arg(long)]
    pub action: String,

    /// Preset group (action set) containing the preset.
    #[arg(long)]
    pub group: String,

    /// Smart-object layer whose contents are replaced.
    #[arg(long)]
    pub layer: String,

    /// Foreground colour as #RRGGBB.
    #[arg(long)]
    pub color: Option<HexColor>,

    /// Which side of the shirt the print is on.
    #[arg(long, default_value = "front")]
    pub direction: PrintDirection,

    /// Write the payload script and print its path without launching the host.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = super::load_config(config_path)?;
        let request = CompositeRequest {
            model_document: super::absolute(&self.model)?,
            shirt_image: super::absolute(&self.shirt)?,
            preset_bundle: self.bundle.as_deref().map(super::absolute).transpose()?,
            action_name: self.action,
            preset_group: self.group,
            layer_name: self.layer,
            color: self.color,
            print_direction: self.direction,
        };

        if self.dry_run {
            let task = tasks::run_preset_task(&config.layout, &request);
            let script = super::renderer(&config)?
                .write_task(&task)
                .context("failed to write payload script")?;
            println!("[dry-run] payload written: {}", script.display());
            println!("[dry-run] expected output: {}", task.artifact_path.display());
            return Ok(());
        }

        let bridge = Bridge::from_config(&config).context("failed to set up the bridge")?;
        let artifact = super::block_on(bridge.composite(&request))?
            .context("composite failed")?;
        println!("{} {}", "✓".green().bold(), artifact.display());
        report_cleanup(&bridge);
        Ok(())
    }
}

pub(crate) fn report_cleanup(bridge: &Bridge) {
    let failures = bridge.cleanup_failures();
    if failures > 0 {
        eprintln!(
            "{} {failures} preset group(s) could not be removed from the host; see `mockup logs`",
            "warning:".yellow().bold()
        );
    }
}
