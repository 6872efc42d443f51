//! File system module - path translation, listing, and change watching.

pub mod listing;
pub mod path_translation;
pub mod watcher;

pub use listing::{
    CacheEntryStats, CacheStats, DirectoryReader, DirectoryResult, FileRecord, FilterSpec, ListingError,
    ListingRequest, ListingService, LocalDirectoryReader, SortField, SortOrder, SortSpec,
};
pub use path_translation::{RuntimeMode, join_logical, translate_path};
pub use watcher::{ChangeWatcher, WatcherError, WatcherStats};
