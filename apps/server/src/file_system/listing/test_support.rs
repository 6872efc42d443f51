//! Record builders shared by the listing unit tests.

use chrono::{DateTime, Utc};
use std::time::{Duration, SystemTime};

use super::metadata::{FileRecord, extension_of};

pub(crate) fn file(name: &str, size: u64) -> FileRecord {
    FileRecord {
        name: name.to_string(),
        path: format!("/test/{}", name),
        size,
        extension: extension_of(name),
        created_at: DateTime::<Utc>::from(SystemTime::UNIX_EPOCH),
        permissions: "100644".to_string(),
        is_directory: false,
    }
}

pub(crate) fn dir(name: &str) -> FileRecord {
    FileRecord {
        size: 0,
        permissions: "40755".to_string(),
        is_directory: true,
        ..file(name, 0)
    }
}

pub(crate) fn file_created_at(name: &str, millis_since_epoch: u64) -> FileRecord {
    FileRecord {
        created_at: DateTime::<Utc>::from(SystemTime::UNIX_EPOCH + Duration::from_millis(millis_since_epoch)),
        ..file(name, 0)
    }
}
