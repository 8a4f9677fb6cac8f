//! Error types for mockup-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from rendering or writing scripts.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading user templates or writing a script.
    #[error("script io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The task lacks an input its template needs.
    #[error("{kind} task is missing `{field}`")]
    MissingInput { kind: String, field: &'static str },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}
