//! Listing orchestration: translate, validate, enumerate (or reuse cache), probe, filter, sort, page.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ListingConfig;
use crate::file_system::listing::caching::{AccessCounter, CacheStats, DirectoryCache};
use crate::file_system::listing::filtering::{FilterSpec, apply_filters};
use crate::file_system::listing::metadata::{FileRecord, collect_entry};
use crate::file_system::listing::pagination::{DEFAULT_PAGE_LIMIT, paginate};
use crate::file_system::listing::reading::{DirectoryReader, LocalDirectoryReader};
use crate::file_system::listing::sorting::{SortSpec, sort_records};
use crate::file_system::path_translation::translate_path;
use crate::file_system::watcher::{ChangeWatcher, WatcherStats};

// ============================================================================
// Request / response types
// ============================================================================

/// One listing request, as received from the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    /// Directory path in the caller's namespace.
    pub dir_path: String,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub sort_by: Option<SortSpec>,
    #[serde(default)]
    pub filter: Option<FilterSpec>,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl ListingRequest {
    /// First page of `dir_path` with the default ordering and no filter.
    pub fn new(dir_path: impl Into<String>) -> Self {
        Self {
            dir_path: dir_path.into(),
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
            sort_by: None,
            filter: None,
        }
    }

    pub fn page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }

    pub fn sorted_by(mut self, sort_by: SortSpec) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn filtered_by(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Listing response. `error` is set only for request-level failures, in which case `items` is
/// empty and `total_count` is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryResult {
    pub items: Vec<FileRecord>,
    /// Number of records after filtering, before pagination.
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DirectoryResult {
    fn failed(message: String) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            error: Some(message),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Why a filesystem call on the target directory failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsFailure {
    NotFound,
    PermissionDenied,
    Other(String),
}

impl std::fmt::Display for FsFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Directory not found"),
            Self::PermissionDenied => write!(f, "Permission denied"),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<std::io::Error> for FsFailure {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Other(err.to_string()),
        }
    }
}

/// Request-level listing failure. Always reported to the caller as `DirectoryResult::error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// The target couldn't be stat'ed.
    Access(FsFailure),
    /// The target exists but isn't a directory. Carries the caller's path.
    NotADirectory(String),
    /// The directory couldn't be enumerated.
    Read(FsFailure),
}

impl std::fmt::Display for ListingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access(failure) => write!(f, "Cannot access directory: {}", failure),
            Self::NotADirectory(path) => write!(f, "Path is not a directory: {}", path),
            Self::Read(failure) => write!(f, "Cannot read directory: {}", failure),
        }
    }
}

impl std::error::Error for ListingError {}

// ============================================================================
// Service
// ============================================================================

/// The directory listing service.
///
/// Owns all cross-request state (name cache, access counts, watches). Construct one at startup
/// and share it, typically behind an `Arc`.
pub struct ListingService {
    config: ListingConfig,
    reader: Arc<dyn DirectoryReader>,
    cache: Arc<DirectoryCache>,
    access: AccessCounter,
    watcher: ChangeWatcher,
}

impl ListingService {
    /// Creates a service that reads the local filesystem.
    pub fn new(config: ListingConfig) -> Self {
        Self::with_reader(config, Arc::new(LocalDirectoryReader))
    }

    pub fn with_reader(config: ListingConfig, reader: Arc<dyn DirectoryReader>) -> Self {
        let cache = Arc::new(DirectoryCache::new(config.cache_ttl, config.max_cache_entries));
        let watcher = ChangeWatcher::new(Arc::clone(&cache), config.max_watchers, config.watch_debounce);
        Self {
            access: AccessCounter::new(config.watch_promotion_threshold),
            config,
            reader,
            cache,
            watcher,
        }
    }

    /// Lists one page of a directory.
    ///
    /// Never fails: request-level problems come back in `DirectoryResult::error`, and entries
    /// whose metadata can't be read are silently left out.
    pub async fn list_directory(&self, request: ListingRequest) -> DirectoryResult {
        log::debug!(
            "list_directory: path={}, skip={}, limit={}, sort={:?}, filter={:?}",
            request.dir_path,
            request.skip,
            request.limit,
            request.sort_by,
            request.filter
        );

        match self.try_list_directory(&request).await {
            Ok(result) => result,
            Err(e) => {
                log::debug!("list_directory failed for {}: {}", request.dir_path, e);
                DirectoryResult::failed(e.to_string())
            }
        }
    }

    async fn try_list_directory(&self, request: &ListingRequest) -> Result<DirectoryResult, ListingError> {
        let overall_start = std::time::Instant::now();
        let resolved = translate_path(&request.dir_path, &self.config.runtime_mode);

        let target = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| ListingError::Access(e.into()))?;
        if !target.is_dir() {
            return Err(ListingError::NotADirectory(request.dir_path.clone()));
        }

        if self.access.record_access(&resolved) {
            self.watcher.promote(&resolved);
        }

        let names = match self.cache.get(&resolved).await {
            Some(names) => {
                log::debug!("Cache hit for {} ({} names)", resolved, names.len());
                names
            }
            None => {
                let names = self.read_entry_names(&resolved).await?;
                // Stamped with the mtime seen before enumerating, so changes made meanwhile read as stale
                match target.modified() {
                    Ok(dir_modified) => self.cache.put(&resolved, names.clone(), dir_modified),
                    Err(e) => log::debug!("Not caching {}: no modification time ({})", resolved, e),
                }
                names
            }
        };

        let records = collect_records(Path::new(&resolved), &names, &request.dir_path).await;
        let filtered = apply_filters(records, request.filter.as_ref());
        let sorted = sort_records(&filtered, request.sort_by.as_ref());
        let items = paginate(&sorted, request.skip, request.limit);

        log::debug!(
            "list_directory: path={}, names={}, matched={}, returned={}, total={}ms",
            resolved,
            names.len(),
            sorted.len(),
            items.len(),
            overall_start.elapsed().as_millis()
        );

        Ok(DirectoryResult {
            items,
            total_count: sorted.len(),
            error: None,
        })
    }

    async fn read_entry_names(&self, resolved: &str) -> Result<Vec<String>, ListingError> {
        let reader = Arc::clone(&self.reader);
        let path = PathBuf::from(resolved);
        tokio::task::spawn_blocking(move || reader.read_entry_names(&path))
            .await
            .map_err(|e| ListingError::Read(FsFailure::Other(format!("enumeration task failed: {}", e))))?
            .map_err(|e| ListingError::Read(e.into()))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn watcher_stats(&self) -> WatcherStats {
        self.watcher.stats()
    }

    /// Drops every cached name list.
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }

    /// Tears down all watches. Call once at process shutdown.
    pub fn shutdown(&self) {
        self.watcher.stop_all();
    }
}

/// Probes every name concurrently, dropping the ones that fail.
async fn collect_records(resolved_dir: &Path, names: &[String], logical_dir: &str) -> Vec<FileRecord> {
    let probes = names.iter().map(|name| collect_entry(resolved_dir, name, logical_dir));
    let records: Vec<FileRecord> = join_all(probes).await.into_iter().flatten().collect();
    if records.len() < names.len() {
        log::debug!(
            "Skipped {} of {} entries in {} (metadata unavailable)",
            names.len() - records.len(),
            names.len(),
            resolved_dir.display()
        );
    }
    records
}
