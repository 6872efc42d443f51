//! Directory listing module - reading, metadata, filtering, sorting, pagination, caching, operations.

pub(crate) mod caching;
pub(crate) mod filtering;
pub(crate) mod metadata;
pub(crate) mod operations;
pub(crate) mod pagination;
pub(crate) mod reading;
pub(crate) mod sorting;

pub use caching::{AccessCounter, CacheEntryStats, CacheStats, DirectoryCache};
pub use filtering::{FilterSpec, apply_filters};
pub use metadata::{FileRecord, collect_entry, extension_of};
pub use operations::{DirectoryResult, FsFailure, ListingError, ListingRequest, ListingService};
pub use pagination::{DEFAULT_PAGE_LIMIT, paginate};
pub use reading::{DirectoryReader, LocalDirectoryReader};
pub use sorting::{SortField, SortOrder, SortSpec, sort_records};

#[cfg(test)]
pub(crate) mod test_support;
