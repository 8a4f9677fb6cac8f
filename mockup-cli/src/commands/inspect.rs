//! `mockup inspect <bundle>`: report the first preset a bundle adds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use mockup_bridge::{tasks, Bridge};

/// Arguments for `mockup inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Preset bundle (.atn) to load.
    pub bundle: PathBuf,

    /// Write the payload script and print its path without launching the host.
    #[arg(long)]
    pub dry_run: bool,
}

impl InspectArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = super::load_config(config_path)?;
        let bundle = super::absolute(&self.bundle)?;

        if self.dry_run {
            let task = tasks::inspect_bundle_task(&config.layout, &bundle);
            let script = super::renderer(&config)?
                .write_task(&task)
                .context("failed to write payload script")?;
            println!("[dry-run] payload written: {}", script.display());
            println!("[dry-run] expected report: {}", task.report_path.display());
            return Ok(());
        }

        let bridge = Bridge::from_config(&config).context("failed to set up the bridge")?;
        let name = super::block_on(bridge.inspect_bundle(&bundle))?
            .with_context(|| format!("could not inspect {}", bundle.display()))?;
        println!("{name}");
        super::run::report_cleanup(&bridge);
        Ok(())
    }
}
