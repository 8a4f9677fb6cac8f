//! Human-readable task log shared by the bridge and the host payload.
//!
//! Lines look like `[Mon, 19 Oct 2026 14:03:11 GMT] [bridge 7f3a…] state → polling`.
//! The payload appends its own `[payload]` lines to the same file with the
//! same UTC stamp. When the
//! file grows past [`MAX_LOG_BYTES`] it is shifted to `bridge.log.1`, keeping
//! at most [`KEEP_ROTATED`] older copies.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use mockup_core::TaskId;

pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
pub const KEEP_ROTATED: usize = 3;

/// Matches `Date.prototype.toUTCString` in the payload.
const STAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Append-only writer for one task's lines. Failures are reported through
/// `tracing` and never abort the task.
#[derive(Debug, Clone)]
pub struct TaskLog {
    path: PathBuf,
    task: TaskId,
}

impl TaskLog {
    pub fn new(path: impl Into<PathBuf>, task: TaskId) -> Self {
        Self {
            path: path.into(),
            task,
        }
    }

    pub fn line(&self, message: impl AsRef<str>) {
        if let Err(err) = self.try_line(message.as_ref()) {
            tracing::warn!(path = %self.path.display(), error = %err, "could not append to task log");
        }
    }

    fn try_line(&self, message: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        rotate_if_needed(&self.path, MAX_LOG_BYTES, KEEP_ROTATED)?;
        let stamp = Utc::now().format(STAMP_FORMAT);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{stamp}] [bridge {}] {message}", self.task)
    }
}

/// Shift `path` to `path.1` once it reaches `max_bytes`. Returns whether a
/// rotation happened; a missing file is not an error.
pub fn rotate_if_needed(path: &Path, max_bytes: u64, keep: usize) -> io::Result<bool> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if len < max_bytes || keep == 0 {
        return Ok(false);
    }

    for n in (1..keep).rev() {
        let from = rotated_path(path, n);
        if from.exists() {
            fs::rename(&from, rotated_path(path, n + 1))?;
        }
    }
    fs::rename(path, rotated_path(path, 1))?;
    Ok(true)
}

fn rotated_path(base: &Path, n: usize) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{n}"));
    base.with_file_name(name)
}
