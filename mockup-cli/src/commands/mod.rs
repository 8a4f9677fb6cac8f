pub mod config;
pub mod diff;
pub mod inspect;
pub mod logs;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use mockup_core::BridgeConfig;
use mockup_renderer::{PayloadSettings, ScriptRenderer};

pub(crate) fn home() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// Effective configuration: `--config` when given, else `~/.mockup/config.yaml`.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<BridgeConfig> {
    let config = match explicit {
        Some(path) => mockup_core::config::load_from(path, &home()?)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => mockup_core::config::load().context("failed to load config")?,
    };
    Ok(config)
}

pub(crate) fn renderer(config: &BridgeConfig) -> Result<ScriptRenderer> {
    ScriptRenderer::with_templates(
        config.template_dir.as_deref(),
        PayloadSettings {
            jpeg_quality: config.output.jpeg_quality,
        },
    )
    .context("failed to load script templates")
}

/// Current-thread runtime for one bridge task.
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// The bridge wants absolute paths; relative ones resolve against the cwd.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    Ok(cwd.join(path))
}
