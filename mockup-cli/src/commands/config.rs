//! `mockup config`: inspect and create `~/.mockup/config.yaml`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use mockup_core::config::{self, BridgeConfig};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as YAML.
    Show,
    /// Write a config file populated with the defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print where the config file is read from.
    Path,
}

pub fn run(command: ConfigCommand, explicit: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = super::load_config(explicit)?;
            print!(
                "{}",
                serde_yaml::to_string(&config).context("failed to render config YAML")?
            );
        }
        ConfigCommand::Init { force } => {
            let home = super::home()?;
            let target = config::config_path_at(&home);
            if target.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    target.display()
                );
            }
            let defaults = BridgeConfig::defaults_at(&home);
            let path = config::save_at(&home, &defaults).context("failed to write config")?;
            config::ensure_layout(&defaults.layout).context("failed to create directories")?;
            println!("wrote {}", path.display());
        }
        ConfigCommand::Path => match explicit {
            Some(path) => println!("{}", path.display()),
            None => println!("{}", config::config_path_at(&super::home()?).display()),
        },
    }
    Ok(())
}
