use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use mockup_core::InvocationResult;

/// Error surface for invocation, polling, cleanup and orchestration.
///
/// Of the task outcomes only `UnsupportedPlatform`, `InvocationFailure`,
/// `Timeout` and `EmptyResult` reach callers of the bridge; `CleanupFailure`
/// is logged and counted.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unsupported platform `{os}`: no scripting host strategy exists")]
    UnsupportedPlatform { os: String },

    #[error("invocation via {host} failed: {message}")]
    InvocationFailure {
        host: String,
        exit_code: Option<i32>,
        message: String,
    },

    #[error("timed out after {waited:?} waiting for {path}")]
    Timeout { path: PathBuf, waited: Duration },

    #[error("{0}")]
    EmptyResult(String),

    #[error("could not delete preset group `{group}`: {message}")]
    CleanupFailure { group: String, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render error: {0}")]
    Render(#[from] mockup_renderer::RenderError),

    #[error("config error: {0}")]
    Config(#[from] mockup_core::ConfigError),

    #[error("registry report JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Failure for a host process that ran and exited non-zero.
    pub(crate) fn from_exit(result: InvocationResult) -> Self {
        let stderr = result.stderr.trim();
        let stdout = result.stdout.trim();
        let message = if !stderr.is_empty() {
            stderr.to_string()
        } else if !stdout.is_empty() {
            stdout.to_string()
        } else {
            format!("exit code {}", result.exit_code)
        };
        BridgeError::InvocationFailure {
            host: result.host,
            exit_code: Some(result.exit_code),
            message,
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BridgeError {
    BridgeError::Io {
        path: path.into(),
        source,
    }
}
