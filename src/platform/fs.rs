// OrderPulse - platform/fs.rs
//
// Filesystem helpers for the output side of a run.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

/// Create `dir` and any missing parents. Succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    tracing::debug!(dir = %dir.display(), "Output directory ready");
    Ok(())
}

/// Create (or truncate) a file for buffered writing.
pub fn create_buffered(path: &Path) -> io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}
