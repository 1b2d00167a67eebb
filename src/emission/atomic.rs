//! Crash-safe file replacement
//!
//! Content is fully rendered in memory, written to a temporary file next to
//! the destination and renamed over it. A failure at any point leaves the
//! previous file untouched.

use super::EmissionError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub fn persist_atomically(path: &Path, content: &[u8]) -> Result<(), EmissionError> {
    let io_error = |source: std::io::Error| EmissionError::Io {
        path: path.display().to_string(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(io_error)?;

    if std::fs::read(path).ok().as_deref() == Some(content) {
        debug!("{} is already up to date", path.display());
        return Ok(());
    }

    let mut temp = NamedTempFile::new_in(parent).map_err(io_error)?;
    temp.write_all(content).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|e| EmissionError::Persist {
        path: path.display().to_string(),
        reason: e.error.to_string(),
    })?;

    info!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

/// Reads a file if it exists; a missing file is an empty document
pub fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, EmissionError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(EmissionError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parents_and_replaces_content() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config").join("retroarch.cfg");

        persist_atomically(&path, b"first\n").expect("first write");
        persist_atomically(&path, b"second\n").expect("second write");

        assert_eq!(std::fs::read(&path).expect("file exists"), b"second\n");
        let leftovers = std::fs::read_dir(path.parent().expect("parent"))
            .expect("dir readable")
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(read_existing(&dir.path().join("nope.ini"))
            .expect("not an error")
            .is_none());
    }
}
