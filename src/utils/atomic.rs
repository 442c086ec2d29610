// utils/atomic.rs - Replace a file through a temporary sibling and rename

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{CaseError, Result};

/// Write `contents` to `path` so readers see either the old or the new file.
///
/// The temporary file lives in the same directory so the final rename
/// stays on one filesystem. It is removed when dropped on any error path.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CaseError::io(dir, e))?;
    tmp.write_all(contents).map_err(|e| CaseError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| CaseError::io(tmp.path(), e))?;

    // Keep the permissions of the file being replaced.
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| CaseError::io(tmp.path(), e))?;
    }

    tmp.persist(path).map_err(|e| CaseError::io(path, e.error))?;
    Ok(())
}
