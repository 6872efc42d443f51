//! Low-level directory enumeration.
//!
//! Only raw entry names are read here. Metadata is probed later, per entry, by
//! `metadata::collect_entry`, so the name list is what the cache stores.

use std::fs;
use std::path::Path;

/// Source of directory entry names.
///
/// The service talks to the filesystem through this trait so tests can count or fake
/// enumeration calls.
pub trait DirectoryReader: Send + Sync {
    /// Returns entry names in the order the filesystem yields them. `.` and `..` are never included.
    fn read_entry_names(&self, path: &Path) -> Result<Vec<String>, std::io::Error>;
}

/// Reads the real local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDirectoryReader;

impl DirectoryReader for LocalDirectoryReader {
    fn read_entry_names(&self, path: &Path) -> Result<Vec<String>, std::io::Error> {
        let read_start = std::time::Instant::now();
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        log::debug!(
            "read_entry_names: path={}, entries={}, read_dir={}ms",
            path.display(),
            names.len(),
            read_start.elapsed().as_millis()
        );
        Ok(names)
    }
}
