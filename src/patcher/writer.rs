//! Atomic file replacement.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Directory a sibling temp file should live in.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write-back step of the patch pipeline.
pub trait FileWriter: Send + Sync {
    /// Replace `path` with `contents`. On error the original must be intact.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// `FileWriter` that goes through `write_atomic`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomicWriter;

impl FileWriter for AtomicWriter {
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        write_atomic(path, contents)
    }
}

/// Replace `path` with `contents` via a temp file and rename.
///
/// The original is either fully replaced or left exactly as it was. The
/// original's permissions are carried over when it exists.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut temp = NamedTempFile::new_in(parent_dir(path))?;
    temp.write_all(contents)?;
    temp.flush()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
