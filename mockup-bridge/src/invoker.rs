//! Platform invoker: an ordered chain of scripting-host launchers.
//!
//! | OS      | Chain                                             |
//! |---------|---------------------------------------------------|
//! | macOS   | `osascript` + AppleScript glue                    |
//! | Windows | `powershell` + `.ps1` glue, then `cscript` + VBS  |
//! | other   | [`BridgeError::UnsupportedPlatform`]              |
//!
//! A launcher whose host binary cannot be spawned reports
//! [`Attempt::NotApplicable`] and the chain moves on. A launcher that ran is
//! final: a failed automation inside a located host is never retried through
//! another host.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use mockup_core::config::{BridgeConfig, HostAppConfig};
use mockup_core::InvocationResult;
use mockup_renderer::{write_script, ScriptKind, ScriptRenderer};

use crate::error::{io_err, BridgeError};

/// What one launcher did with a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// The host is absent on this machine; try the next launcher.
    NotApplicable(String),
    /// The host ran to completion (successfully or not).
    Ran(InvocationResult),
}

/// One way of getting a payload executed by the host application.
#[async_trait]
pub trait Launcher: Send + Sync {
    fn name(&self) -> &str;

    async fn launch(&self, payload: &Path) -> Result<Attempt, BridgeError>;
}

// ---------------------------------------------------------------------------
// Process runner
// ---------------------------------------------------------------------------

/// Spawn `program`, capture its output, and kill it after `deadline`.
///
/// A program that cannot be found yields `Attempt::NotApplicable`.
pub async fn run_host(
    host: &str,
    program: &str,
    args: &[OsString],
    deadline: Duration,
) -> Result<Attempt, BridgeError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Ok(Attempt::NotApplicable(format!("`{program}` not found")));
        }
        Err(err) => return Err(io_err(program, err)),
    };

    // Dropping the wait future on timeout drops the child, which kills it.
    match tokio::time::timeout(deadline, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(Attempt::Ran(InvocationResult {
            host: host.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })),
        Ok(Err(err)) => Err(io_err(program, err)),
        Err(_) => Err(BridgeError::InvocationFailure {
            host: host.to_string(),
            exit_code: None,
            message: format!("killed after exceeding the {deadline:?} deadline"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Glue launchers
// ---------------------------------------------------------------------------

/// Renders a glue script next to the payload and runs it with a host program.
pub struct GlueLauncher {
    label: &'static str,
    program: String,
    leading_args: Vec<OsString>,
    glue: ScriptKind,
    host: HostAppConfig,
    renderer: Arc<ScriptRenderer>,
    deadline: Duration,
}

impl GlueLauncher {
    /// `osascript <payload>.applescript`
    pub fn applescript(config: &BridgeConfig, renderer: Arc<ScriptRenderer>) -> Self {
        Self {
            label: "osascript",
            program: config.programs.osascript.clone(),
            leading_args: vec![],
            glue: ScriptKind::AppleScriptGlue,
            host: config.host.clone(),
            renderer,
            deadline: config.timeouts.invocation(),
        }
    }

    /// `powershell -NoProfile -NonInteractive -ExecutionPolicy Bypass -File <payload>.ps1`
    pub fn powershell(config: &BridgeConfig, renderer: Arc<ScriptRenderer>) -> Self {
        Self {
            label: "powershell",
            program: config.programs.powershell.clone(),
            leading_args: ["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-File"]
                .into_iter()
                .map(OsString::from)
                .collect(),
            glue: ScriptKind::PowerShellGlue,
            host: config.host.clone(),
            renderer,
            deadline: config.timeouts.invocation(),
        }
    }

    /// `cscript //NoLogo <payload>.vbs`
    pub fn cscript(config: &BridgeConfig, renderer: Arc<ScriptRenderer>) -> Self {
        Self {
            label: "cscript",
            program: config.programs.cscript.clone(),
            leading_args: vec![OsString::from("//NoLogo")],
            glue: ScriptKind::VbScriptGlue,
            host: config.host.clone(),
            renderer,
            deadline: config.timeouts.invocation(),
        }
    }

    pub fn glue_path(&self, payload: &Path) -> PathBuf {
        payload.with_extension(self.glue.extension())
    }
}

#[async_trait]
impl Launcher for GlueLauncher {
    fn name(&self) -> &str {
        self.label
    }

    async fn launch(&self, payload: &Path) -> Result<Attempt, BridgeError> {
        let glue_path = self.glue_path(payload);
        let glue = self.renderer.render_glue(self.glue, &self.host, payload)?;
        write_script(&glue_path, &glue)?;

        let mut args = self.leading_args.clone();
        args.push(glue_path.into_os_string());
        tracing::debug!(host = self.label, payload = %payload.display(), "launching host");
        run_host(self.label, &self.program, &args, self.deadline).await
    }
}

// ---------------------------------------------------------------------------
// PlatformInvoker
// ---------------------------------------------------------------------------

/// Tries each launcher in order until one runs the payload.
pub struct PlatformInvoker {
    launchers: Vec<Box<dyn Launcher>>,
}

impl PlatformInvoker {
    pub fn new(launchers: Vec<Box<dyn Launcher>>) -> Self {
        Self { launchers }
    }

    /// Strategy chain for `os` (values of `std::env::consts::OS`).
    pub fn for_platform(
        os: &str,
        config: &BridgeConfig,
        renderer: Arc<ScriptRenderer>,
    ) -> Result<Self, BridgeError> {
        let launchers: Vec<Box<dyn Launcher>> = match os {
            "macos" => vec![Box::new(GlueLauncher::applescript(config, renderer))],
            "windows" => vec![
                Box::new(GlueLauncher::powershell(config, renderer.clone())),
                Box::new(GlueLauncher::cscript(config, renderer)),
            ],
            other => {
                return Err(BridgeError::UnsupportedPlatform {
                    os: other.to_string(),
                })
            }
        };
        Ok(Self::new(launchers))
    }

    pub fn for_current_platform(
        config: &BridgeConfig,
        renderer: Arc<ScriptRenderer>,
    ) -> Result<Self, BridgeError> {
        Self::for_platform(std::env::consts::OS, config, renderer)
    }

    pub fn launcher_names(&self) -> Vec<&str> {
        self.launchers.iter().map(|l| l.name()).collect()
    }

    /// Run `payload` through the first applicable launcher.
    ///
    /// Non-zero exit is `InvocationFailure` carrying the captured stderr.
    pub async fn invoke(&self, payload: &Path) -> Result<InvocationResult, BridgeError> {
        let mut skipped = Vec::new();
        for launcher in &self.launchers {
            match launcher.launch(payload).await? {
                Attempt::NotApplicable(reason) => {
                    tracing::warn!(host = launcher.name(), %reason, "scripting host unavailable, falling back");
                    skipped.push(format!("{}: {reason}", launcher.name()));
                }
                Attempt::Ran(result) if result.success() => {
                    tracing::info!(host = %result.host, "host finished payload");
                    return Ok(result);
                }
                Attempt::Ran(result) => {
                    tracing::error!(host = %result.host, exit_code = result.exit_code, "host reported failure");
                    return Err(BridgeError::from_exit(result));
                }
            }
        }
        Err(BridgeError::InvocationFailure {
            host: "none".to_string(),
            exit_code: None,
            message: if skipped.is_empty() {
                "no scripting host configured".to_string()
            } else {
                format!("no scripting host available ({})", skipped.join("; "))
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
