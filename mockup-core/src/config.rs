//! YAML bridge configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.mockup/
//!   config.yaml   (optional, every field has a default)
//!   scripts/      (generated payloads and host glue)
//!   logs/         (bridge.log)
//!   uploads/      (inputs and rendered outputs)
//! ```
//!
//! # API pattern
//!
//! Every function touching the home directory has two forms:
//! - `fn_at(home: &Path, …)`: explicit home, used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

pub const CONFIG_FILE: &str = "config.yaml";
pub const LOG_FILE: &str = "bridge.log";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// How the host application is addressed from OS scripting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostAppConfig {
    /// Application name used in `tell application "…"`.
    pub app_name: String,
    /// COM ProgID used by the Windows hosts.
    pub com_prog_id: String,
}

impl Default for HostAppConfig {
    fn default() -> Self {
        Self {
            app_name: "Adobe Photoshop 2024".to_string(),
            com_prog_id: "Photoshop.Application".to_string(),
        }
    }
}

/// Executables of the scripting hosts, resolved through `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramsConfig {
    pub osascript: String,
    pub powershell: String,
    pub cscript: String,
}

impl Default for ProgramsConfig {
    fn default() -> Self {
        Self {
            osascript: "osascript".to_string(),
            powershell: "powershell".to_string(),
            cscript: "cscript".to_string(),
        }
    }
}

/// Filesystem layout. Empty entries resolve under `<home>/.mockup/`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub scripts_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub uploads_dir: PathBuf,
}

impl LayoutConfig {
    pub fn under(root: &Path) -> Self {
        Self {
            scripts_dir: root.join("scripts"),
            logs_dir: root.join("logs"),
            uploads_dir: root.join("uploads"),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.logs_dir.join(LOG_FILE)
    }

    fn fill_from(&mut self, defaults: LayoutConfig) {
        if self.scripts_dir.as_os_str().is_empty() {
            self.scripts_dir = defaults.scripts_dir;
        }
        if self.logs_dir.as_os_str().is_empty() {
            self.logs_dir = defaults.logs_dir;
        }
        if self.uploads_dir.as_os_str().is_empty() {
            self.uploads_dir = defaults.uploads_dir;
        }
    }
}

/// Fixed-interval artifact polling budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval_ms: 2_000,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Hard deadlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// A launched host process is killed after this long.
    pub invocation_secs: u64,
    /// Whole task (render, invoke, poll, read back), excluding cleanup.
    pub task_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            invocation_secs: 180,
            task_secs: 300,
        }
    }
}

impl TimeoutConfig {
    pub fn invocation(&self) -> Duration {
        Duration::from_secs(self.invocation_secs)
    }

    pub fn task(&self) -> Duration {
        Duration::from_secs(self.task_secs)
    }
}

/// Rendered output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JPEG quality on the host's 0–12 scale.
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { jpeg_quality: 10 }
    }
}

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub host: HostAppConfig,
    pub programs: ProgramsConfig,
    pub layout: LayoutConfig,
    pub polling: PollingConfig,
    pub timeouts: TimeoutConfig,
    pub output: OutputConfig,
    /// Directory of `.tera` files overriding the embedded script templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
}

impl BridgeConfig {
    /// Defaults with the layout rooted at `<home>/.mockup/`.
    pub fn defaults_at(home: &Path) -> Self {
        Self {
            layout: LayoutConfig::under(&mockup_root(home)),
            ..Self::default()
        }
    }

    /// Reject values that would make the bridge hang or misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "polling.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "polling.interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.timeouts.invocation_secs == 0 || self.timeouts.task_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeouts",
                reason: "deadlines must be greater than zero".to_string(),
            });
        }
        if self.output.jpeg_quality > 12 {
            return Err(ConfigError::Invalid {
                field: "output.jpeg_quality",
                reason: format!("{} is outside 0..=12", self.output.jpeg_quality),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.mockup/`
pub fn mockup_root(home: &Path) -> PathBuf {
    home.join(".mockup")
}

/// `<home>/.mockup/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    mockup_root(home).join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load `path`, filling unset layout entries under `<home>/.mockup/`.
///
/// A missing file yields the defaults; malformed YAML is
/// `ConfigError::Parse` with the path attached.
pub fn load_from(path: &Path, home: &Path) -> Result<BridgeConfig, ConfigError> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        serde_yaml::from_str::<BridgeConfig>(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        BridgeConfig::default()
    };
    config
        .layout
        .fill_from(LayoutConfig::under(&mockup_root(home)));
    config.validate()?;
    Ok(config)
}

/// Load `<home>/.mockup/config.yaml`.
pub fn load_at(home: &Path) -> Result<BridgeConfig, ConfigError> {
    load_from(&config_path_at(home), home)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<BridgeConfig, ConfigError> {
    load_at(&home()?)
}

/// Write `config` to `<home>/.mockup/config.yaml`, creating the directory.
pub fn save_at(home: &Path, config: &BridgeConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path_at(home);
    let root = mockup_root(home);
    std::fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&path, yaml).map_err(|e| io_err(&path, e))?;
    Ok(path)
}

/// Create the scripts, logs and uploads directories.
pub fn ensure_layout(layout: &LayoutConfig) -> Result<(), ConfigError> {
    for dir in [&layout.scripts_dir, &layout.logs_dir, &layout.uploads_dir] {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    Ok(())
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
