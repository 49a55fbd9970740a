//! Document I/O: atomic replace, JSON load/save, and the plan lock.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{PlanError, Result};

/// Load a JSON document. A missing file is `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let Some(contents) = read_text(path)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&contents).map_err(|e| PlanError::parse(path, e))?;
    Ok(Some(value))
}

/// Pretty-print `value` and atomically replace `path` with it.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value).map_err(|e| PlanError::parse(path, e))?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Read a text document. A missing file is `Ok(None)`.
pub fn read_text(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PlanError::io(path, e)),
    }
}

/// Write `contents` to a sibling temp file, flush it to disk, then rename it
/// over `path`. Readers see either the old or the new document, never a mix.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        PlanError::io(
            path,
            std::io::Error::new(ErrorKind::InvalidInput, "path has no parent directory"),
        )
    })?;
    fs::create_dir_all(parent).map_err(|e| PlanError::io(parent, e))?;

    let tmp_path = tmp_path_for(path);
    debug!(path = %path.display(), "replacing document");

    let result = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(PlanError::io(path, e));
    }
    sync_dir(parent)
}

/// Flush a directory entry so a completed rename survives power loss.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| PlanError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Exclusive advisory lock on the plan directory, held for one mutation.
///
/// Released when dropped.
pub struct PlanLock {
    file: File,
}

impl PlanLock {
    /// Block until the lock file at `path` can be locked exclusively.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| PlanError::io(path, e))?;
        file.lock_exclusive().map_err(|e| PlanError::io(path, e))?;
        Ok(Self { file })
    }
}

impl Drop for PlanLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        version: Option<String>,
    }

    #[test]
    fn missing_document_reads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let doc: Option<Doc> = read_json(&temp.path().join("absent.json")).expect("read");
        assert!(doc.is_none());
    }

    #[test]
    fn write_replaces_and_leaves_no_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("active.json");

        write_json(&path, &Doc { version: Some("1.0.0".into()) }).expect("write");
        write_json(&path, &Doc { version: None }).expect("rewrite");

        let doc: Doc = read_json(&path).expect("read").expect("present");
        assert_eq!(doc, Doc { version: None });
        assert!(!temp.path().join("nested").join("active.json.tmp").exists());
        assert!(fs::read_to_string(&path).expect("raw").ends_with('\n'));
    }

    #[test]
    fn directory_sync_follows_rename() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("v1.0.0").join("report.md");

        write_atomic(&path, "# Report").expect("write");

        sync_dir(temp.path().join("v1.0.0").as_path()).expect("sync");
        assert_eq!(fs::read_to_string(&path).expect("raw"), "# Report");
    }

    #[test]
    fn sync_of_missing_directory_is_an_io_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = sync_dir(&temp.path().join("absent"));
        if cfg!(unix) {
            assert_eq!(result.expect_err("should fail").kind(), "Io");
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").expect("seed");

        let err = read_json::<Doc>(&path).expect_err("should fail");
        assert_eq!(err.kind(), "Parse");
    }

    #[test]
    fn lock_can_be_reacquired_after_drop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".lock");

        drop(PlanLock::acquire(&path).expect("first"));
        let _second = PlanLock::acquire(&path).expect("second");
    }
}
