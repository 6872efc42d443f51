//! Predicate filtering over file records.

use serde::{Deserialize, Serialize};

use crate::file_system::listing::metadata::FileRecord;

/// Optional predicates, ANDed together. Unset (or empty-string) predicates match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    /// Exact match on entry kind.
    pub is_directory: Option<bool>,
    /// Inclusive lower size bound in bytes. Fractional bounds are accepted. Directories always pass.
    pub min_size: Option<f64>,
    /// Inclusive upper size bound in bytes. Fractional bounds are accepted. Directories always pass.
    pub max_size: Option<f64>,
    /// Case-insensitive suffix of the extension, like `.txt` or `txt`. Directories always pass.
    pub extension: Option<String>,
}

impl FilterSpec {
    /// Returns true if `record` satisfies every predicate that is set.
    pub fn matches(&self, record: &FileRecord) -> bool {
        if let Some(needle) = non_empty(&self.name_contains)
            && !record.name.to_lowercase().contains(&needle.to_lowercase())
        {
            return false;
        }

        if let Some(is_directory) = self.is_directory
            && record.is_directory != is_directory
        {
            return false;
        }

        // Size and extension only constrain files
        if record.is_directory {
            return true;
        }

        let size = record.size as f64;
        if self.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.max_size.is_some_and(|max| size > max) {
            return false;
        }

        if let Some(wanted) = non_empty(&self.extension)
            && (record.extension.is_empty()
                || !record.extension.to_lowercase().ends_with(&wanted.to_lowercase()))
        {
            return false;
        }

        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Keeps the records matching `spec`, preserving their relative order. No spec keeps everything.
pub fn apply_filters(records: Vec<FileRecord>, spec: Option<&FilterSpec>) -> Vec<FileRecord> {
    match spec {
        None => records,
        Some(spec) => records.into_iter().filter(|r| spec.matches(r)).collect(),
    }
}
