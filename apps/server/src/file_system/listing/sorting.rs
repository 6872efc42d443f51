//! Sorting configuration and logic for file listings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::file_system::listing::metadata::FileRecord;

// ============================================================================
// Sorting configuration
// ============================================================================

/// Field to sort records by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortField {
    Name,
    Size,
    CreatedAt,
    Extension,
    IsDirectory,
}

/// Sort order (ascending or descending).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A caller-supplied ordering. Nothing carries over between requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

// ============================================================================
// Sorting logic
// ============================================================================

/// Compares two names: natural (so "img_2" comes before "img_10") and case-insensitive,
/// with lowercase ahead of uppercase when names differ only in case.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    alphanumeric_sort::compare_str(a.to_lowercase(), b.to_lowercase()).then_with(|| b.cmp(a))
}

/// Directories before files.
fn directories_first(a: &FileRecord, b: &FileRecord) -> Ordering {
    match (a.is_directory, b.is_directory) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn compare_by_field(a: &FileRecord, b: &FileRecord, field: SortField) -> Ordering {
    match field {
        SortField::Name => compare_names(&a.name, &b.name),
        SortField::Size => directories_first(a, b).then_with(|| a.size.cmp(&b.size)),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Extension => {
            directories_first(a, b).then_with(|| compare_names(&a.extension, &b.extension))
        }
        SortField::IsDirectory => directories_first(a, b),
    }
}

/// Returns a sorted copy of `records`; the input is left untouched.
///
/// Without a spec: directories first, then by name ascending.
/// With a spec, the comparator for `field` is applied and the whole result is reversed for
/// `Desc`. SIZE and EXTENSION compare kind first, so directories and files never interleave
/// in either direction. The sort is stable: records with equal keys keep their input order.
pub fn sort_records(records: &[FileRecord], spec: Option<&SortSpec>) -> Vec<FileRecord> {
    let mut sorted = records.to_vec();
    match spec {
        None => sorted.sort_by(|a, b| directories_first(a, b).then_with(|| compare_names(&a.name, &b.name))),
        Some(spec) => sorted.sort_by(|a, b| {
            let primary = compare_by_field(a, b, spec.field);
            match spec.order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            }
        }),
    }
    sorted
}
