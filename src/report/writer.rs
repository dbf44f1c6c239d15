use std::io::{self, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use super::ReportError;

/// Write `contents` to `path` through a temporary file in the same directory.
///
/// Readers see either the previous file or the complete new one; on error
/// the destination is left untouched and the temporary file is removed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), ReportError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    persist(dir, path, contents).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

fn persist(dir: &Path, path: &Path, contents: &str) -> io::Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
