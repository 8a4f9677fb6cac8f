//! Script writer.
//!
//! Scripts are never versioned or appended: each write replaces the file at
//! the destination. Content goes to `<path>.mockup.tmp` first and is renamed
//! over the destination, so the host never opens a half-written script.

use std::path::{Path, PathBuf};

use crate::error::{io_err, RenderError};

/// Write `content` to `path`, creating parent directories and overwriting
/// any existing file. Line endings are normalised to LF.
pub fn write_script(path: &Path, content: &str) -> Result<(), RenderError> {
    let tmp = PathBuf::from(format!("{}.mockup.tmp", path.display()));
    let normalized = content.replace("\r\n", "\n");

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(&tmp, normalized.as_bytes()).map_err(|e| io_err(&tmp, e))?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }

    tracing::debug!(path = %path.display(), bytes = normalized.len(), "wrote script");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("scripts").join("a.jsx");
        write_script(&path, "alert(1);\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "alert(1);\n");
    }

    #[test]
    fn overwrites_instead_of_appending() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jsx");
        write_script(&path, "first\n").unwrap();
        write_script(&path, "second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
    }

    #[test]
    fn leaves_no_tmp_file_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jsx");
        write_script(&path, "x\r\ny\r\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\ny\n");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".mockup.tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
