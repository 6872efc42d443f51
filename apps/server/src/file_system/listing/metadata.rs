//! File record type and the per-entry metadata probe.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use crate::file_system::path_translation::join_logical;

/// A single directory entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub name: String,
    /// Logical path (the caller's namespace, not the translated one), so it can be fed back
    /// into another listing request.
    pub path: String,
    /// Bytes. Only meaningful for files.
    pub size: u64,
    /// Extension including the leading dot, or empty.
    pub extension: String,
    #[serde(serialize_with = "serialize_iso", deserialize_with = "deserialize_iso")]
    pub created_at: DateTime<Utc>,
    /// Full mode bits in octal, like `100644`.
    pub permissions: String,
    pub is_directory: bool,
}

fn serialize_iso<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_iso(value))
}

fn deserialize_iso<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

/// ISO-8601 in UTC with millisecond precision, like `2024-05-01T12:00:00.000Z`.
pub fn format_iso(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Extracts the extension the way most path libraries do: everything from the last dot,
/// dot included. Names without a dot, or whose only dots are leading (`.gitignore`),
/// have no extension.
pub fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(dot_pos) if name[..dot_pos].chars().any(|c| c != '.') => name[dot_pos..].to_string(),
        _ => String::new(),
    }
}

/// Builds a record from already-fetched metadata.
pub fn record_from_metadata(name: &str, logical_dir: &str, metadata: &Metadata) -> FileRecord {
    let is_directory = metadata.is_dir();
    FileRecord {
        name: name.to_string(),
        path: join_logical(logical_dir, name),
        size: if is_directory { 0 } else { metadata.len() },
        extension: extension_of(name),
        created_at: DateTime::<Utc>::from(creation_time(metadata)),
        permissions: format_permissions(metadata),
        is_directory,
    }
}

/// Probes one entry and builds its record.
///
/// Follows symlinks, so a broken link is a failed probe. Any failure (permission denied,
/// entry deleted between enumeration and probe, broken link) yields `None`: the entry is
/// dropped from the listing, never surfaced as an error.
pub async fn collect_entry(resolved_dir: &Path, name: &str, logical_dir: &str) -> Option<FileRecord> {
    let full_path = resolved_dir.join(name);
    match tokio::fs::metadata(&full_path).await {
        Ok(metadata) => Some(record_from_metadata(name, logical_dir, &metadata)),
        Err(e) => {
            log::debug!("Skipping entry {}: {}", full_path.display(), e);
            None
        }
    }
}

/// Birth time where the platform reports one, otherwise mtime.
fn creation_time(metadata: &Metadata) -> SystemTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(unix)]
fn format_permissions(metadata: &Metadata) -> String {
    use std::os::unix::fs::MetadataExt;
    format!("{:o}", metadata.mode())
}

#[cfg(not(unix))]
fn format_permissions(metadata: &Metadata) -> String {
    // No mode bits: synthesize the POSIX equivalent of the read-only flag
    let type_bits = if metadata.is_dir() { 0o040000 } else { 0o100000 };
    let perm_bits = if metadata.permissions().readonly() { 0o444 } else { 0o666 };
    format!("{:o}", type_bits | perm_bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.txt"), ".txt");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".gitignore"), "");
        assert_eq!(extension_of(".config.json"), ".json");
        assert_eq!(extension_of("trailing."), ".");
    }

    #[test]
    fn test_format_iso_uses_millis_and_z() {
        let dt = DateTime::parse_from_rfc3339("2024-05-01T12:00:00.5+02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_iso(&dt), "2024-05-01T10:00:00.500Z");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = FileRecord {
            name: "a.txt".to_string(),
            path: "/data/a.txt".to_string(),
            size: 5,
            extension: ".txt".to_string(),
            created_at: DateTime::<Utc>::from(SystemTime::UNIX_EPOCH),
            permissions: "100644".to_string(),
            is_directory: false,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00.000Z");
        assert_eq!(json["isDirectory"], false);
        assert_eq!(json["permissions"], "100644");

        let back: FileRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[tokio::test]
    async fn test_collect_entry_for_file_and_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("notes.md"), "hello").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let file = collect_entry(temp.path(), "notes.md", "/logical").await.unwrap();
        assert_eq!(file.name, "notes.md");
        assert_eq!(file.path, "/logical/notes.md");
        assert_eq!(file.size, 5);
        assert_eq!(file.extension, ".md");
        assert!(!file.is_directory);
        assert!(!file.permissions.is_empty());
        assert!(u32::from_str_radix(&file.permissions, 8).is_ok());

        let dir = collect_entry(temp.path(), "sub", "/logical").await.unwrap();
        assert!(dir.is_directory);
        assert_eq!(dir.path, "/logical/sub");
    }

    #[tokio::test]
    async fn test_collect_entry_skips_missing_entry() {
        let temp = tempfile::tempdir().unwrap();
        assert!(collect_entry(temp.path(), "vanished.txt", "/x").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_collect_entry_skips_broken_symlink() {
        let temp = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(temp.path().join("nowhere"), temp.path().join("dangling")).unwrap();

        assert!(collect_entry(temp.path(), "dangling", "/x").await.is_none());
    }
}
