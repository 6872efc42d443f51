//! Change watching for frequently listed directories.
//!
//! Directories that get listed often are promoted to a native watch. Any change event from any
//! watched directory drops the whole listing cache: cheap to reason about, never serves a stale
//! name list, and the mtime check in the cache still covers directories that aren't watched.

use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer,
    notify::{RecommendedWatcher, RecursiveMode},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::file_system::listing::DirectoryCache;
use crate::ignore_poison::IgnorePoison;

/// Errors that can occur when starting a watch.
#[derive(Debug)]
pub enum WatcherError {
    Create(String),
    Watch { path: String, message: String },
}

impl std::fmt::Display for WatcherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatcherError::Create(msg) => write!(f, "Failed to create watcher: {msg}"),
            WatcherError::Watch { path, message } => write!(f, "Failed to watch {path}: {message}"),
        }
    }
}

impl std::error::Error for WatcherError {}

/// Snapshot of active watches, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherStats {
    pub count: usize,
    pub paths: Vec<String>,
}

/// State for a watched directory.
struct WatchedDirectory {
    /// Distinguishes a re-promoted path from the watch it replaced, so a late error from the
    /// old debouncer can't tear down the new one.
    id: u64,
    path: String,
    #[allow(dead_code, reason = "Debouncer must be held to keep watching")]
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

type WatchSet = Mutex<Vec<WatchedDirectory>>;

/// Bounded set of directory watches that invalidate the listing cache on change.
pub struct ChangeWatcher {
    cache: Arc<DirectoryCache>,
    max_watchers: usize,
    debounce: Duration,
    /// Insertion-ordered, so index 0 is the oldest watch.
    watches: Arc<WatchSet>,
    next_id: AtomicU64,
}

impl ChangeWatcher {
    pub fn new(cache: Arc<DirectoryCache>, max_watchers: usize, debounce: Duration) -> Self {
        Self {
            cache,
            max_watchers: max_watchers.max(1),
            debounce,
            watches: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Starts watching `resolved_path` unless it's already watched.
    ///
    /// When the set is full, the first-registered watch is dropped to make room. Failures are
    /// logged and leave the set unchanged; listing keeps working without the watch.
    /// Returns true if a new watch was started.
    pub fn promote(&self, resolved_path: &str) -> bool {
        let mut evicted = None;
        let result = {
            let mut watches = self.watches.lock_ignore_poison();
            if watches.iter().any(|w| w.path == resolved_path) {
                return false;
            }

            match self.start_watch(resolved_path) {
                Ok(watched) => {
                    if watches.len() >= self.max_watchers {
                        evicted = Some(watches.remove(0));
                    }
                    watches.push(watched);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        };

        // Dropped outside the lock: tearing down a debouncer shouldn't block other promotions
        if let Some(old) = evicted {
            log::info!("Watch limit ({}) reached, no longer watching {}", self.max_watchers, old.path);
        }

        match result {
            Ok(()) => {
                log::info!("Started watching {}", resolved_path);
                true
            }
            Err(e) => {
                log::warn!("Couldn't promote {} to a watch: {}", resolved_path, e);
                false
            }
        }
    }

    fn start_watch(&self, resolved_path: &str) -> Result<WatchedDirectory, WatcherError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cache = Arc::clone(&self.cache);
        let watches = Arc::downgrade(&self.watches);
        let path_for_closure = resolved_path.to_string();

        let mut debouncer = new_debouncer(self.debounce, None, move |result: DebounceEventResult| {
            handle_watch_result(&cache, &watches, id, &path_for_closure, result);
        })
        .map_err(|e| WatcherError::Create(e.to_string()))?;

        debouncer
            .watch(Path::new(resolved_path), RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::Watch {
                path: resolved_path.to_string(),
                message: e.to_string(),
            })?;

        Ok(WatchedDirectory {
            id,
            path: resolved_path.to_string(),
            debouncer,
        })
    }

    /// Stops watching a single directory. No-op if it isn't watched.
    pub fn unwatch(&self, resolved_path: &str) {
        let removed = {
            let mut watches = self.watches.lock_ignore_poison();
            watches
                .iter()
                .position(|w| w.path == resolved_path)
                .map(|index| watches.remove(index))
        };
        if removed.is_some() {
            log::info!("Stopped watching {}", resolved_path);
        }
    }

    /// Tears down every watch. Called at process shutdown.
    pub fn stop_all(&self) {
        let all = std::mem::take(&mut *self.watches.lock_ignore_poison());
        log::info!("Stopping all directory watches ({} active)", all.len());
        drop(all);
    }

    #[cfg(test)]
    pub(crate) fn is_watching(&self, resolved_path: &str) -> bool {
        self.watches.lock_ignore_poison().iter().any(|w| w.path == resolved_path)
    }

    pub fn stats(&self) -> WatcherStats {
        let watches = self.watches.lock_ignore_poison();
        WatcherStats {
            count: watches.len(),
            paths: watches.iter().map(|w| w.path.clone()).collect(),
        }
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Runs on the debouncer thread for every batch of events or errors.
fn handle_watch_result(
    cache: &DirectoryCache,
    watches: &Weak<WatchSet>,
    id: u64,
    path: &str,
    result: DebounceEventResult,
) {
    match result {
        Ok(events) => {
            // Reads (ours included) show up as access events on some backends; they change nothing
            let changes = events.iter().filter(|e| !e.event.kind.is_access()).count();
            if changes > 0 {
                log::debug!("Watcher: {} change(s) in {}, invalidating listing cache", changes, path);
                cache.invalidate_all();
            }
        }
        Err(errors) => {
            for error in &errors {
                log::warn!("Watcher error for {}: {}", path, error);
            }
            let Some(watches) = watches.upgrade() else {
                return;
            };
            let removed = {
                let mut watches = watches.lock_ignore_poison();
                watches
                    .iter()
                    .position(|w| w.id == id)
                    .map(|index| watches.remove(index))
            };
            if removed.is_some() {
                log::info!("Watcher: stopped watching {} after error", path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_debouncer_full::notify;
    use std::fs;
    use std::time::{Instant, SystemTime};

    fn watcher_with(max: usize) -> (Arc<DirectoryCache>, ChangeWatcher) {
        let cache = Arc::new(DirectoryCache::new(Duration::from_secs(30), 10));
        let watcher = ChangeWatcher::new(Arc::clone(&cache), max, Duration::from_millis(20));
        (cache, watcher)
    }

    fn make_dirs(root: &Path, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let dir = root.join(format!("w{}", i));
                fs::create_dir(&dir).unwrap();
                dir.to_string_lossy().to_string()
            })
            .collect()
    }

    #[test]
    fn test_promote_starts_single_watch() {
        let temp = tempfile::tempdir().unwrap();
        let dirs = make_dirs(temp.path(), 1);
        let (_cache, watcher) = watcher_with(5);

        assert!(watcher.promote(&dirs[0]));
        assert!(!watcher.promote(&dirs[0]), "second promote must be a no-op");

        assert_eq!(
            watcher.stats(),
            WatcherStats {
                count: 1,
                paths: vec![dirs[0].clone()]
            }
        );
    }

    #[test]
    fn test_promote_evicts_first_registered_when_full() {
        let temp = tempfile::tempdir().unwrap();
        let dirs = make_dirs(temp.path(), 3);
        let (_cache, watcher) = watcher_with(2);

        for dir in &dirs {
            assert!(watcher.promote(dir));
        }

        let stats = watcher.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.paths, vec![dirs[1].clone(), dirs[2].clone()]);
        assert!(!watcher.is_watching(&dirs[0]));
    }

    #[test]
    fn test_promote_nonexistent_directory_fails_softly() {
        let (_cache, watcher) = watcher_with(2);

        assert!(!watcher.promote("/definitely_does_not_exist_12345"));
        assert_eq!(watcher.stats().count, 0);
    }

    #[test]
    fn test_unwatch_and_stop_all() {
        let temp = tempfile::tempdir().unwrap();
        let dirs = make_dirs(temp.path(), 3);
        let (_cache, watcher) = watcher_with(5);
        for dir in &dirs {
            watcher.promote(dir);
        }

        watcher.unwatch(&dirs[1]);
        assert_eq!(watcher.stats().paths, vec![dirs[0].clone(), dirs[2].clone()]);

        watcher.stop_all();
        assert_eq!(watcher.stats().count, 0);
    }

    #[test]
    fn test_change_event_invalidates_whole_cache() {
        let temp = tempfile::tempdir().unwrap();
        let dirs = make_dirs(temp.path(), 1);
        let (cache, watcher) = watcher_with(5);
        assert!(watcher.promote(&dirs[0]));

        // Unrelated key: invalidation is coarse, not per-path
        cache.put("/some/other/dir", vec!["x".to_string()], SystemTime::UNIX_EPOCH);
        assert_eq!(cache.len(), 1);

        fs::write(Path::new(&dirs[0]).join("new.txt"), "hi").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !cache.is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(cache.is_empty(), "change event should have cleared the cache");
    }

    #[test]
    fn test_watch_error_tears_down_only_that_watch() {
        let temp = tempfile::tempdir().unwrap();
        let dirs = make_dirs(temp.path(), 2);
        let (cache, watcher) = watcher_with(5);
        watcher.promote(&dirs[0]);
        watcher.promote(&dirs[1]);
        cache.put("/kept", vec!["x".to_string()], SystemTime::UNIX_EPOCH);

        let first_id = watcher.watches.lock_ignore_poison()[0].id;
        let weak = Arc::downgrade(&watcher.watches);
        handle_watch_result(
            &cache,
            &weak,
            first_id,
            &dirs[0],
            Err(vec![notify::Error::generic("backend went away")]),
        );

        assert_eq!(watcher.stats().paths, vec![dirs[1].clone()]);
        assert_eq!(cache.len(), 1, "watch errors must not touch the cache");
    }

    #[test]
    fn test_stale_error_does_not_remove_repromoted_watch() {
        let temp = tempfile::tempdir().unwrap();
        let dirs = make_dirs(temp.path(), 1);
        let (cache, watcher) = watcher_with(5);
        watcher.promote(&dirs[0]);
        let old_id = watcher.watches.lock_ignore_poison()[0].id;
        watcher.unwatch(&dirs[0]);
        watcher.promote(&dirs[0]);

        let weak = Arc::downgrade(&watcher.watches);
        handle_watch_result(&cache, &weak, old_id, &dirs[0], Err(vec![notify::Error::generic("late")]));

        assert!(watcher.is_watching(&dirs[0]));
    }

    #[test]
    fn test_watcher_stats_serializes() {
        let stats = WatcherStats {
            count: 1,
            paths: vec!["/a".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            serde_json::json!({"count": 1, "paths": ["/a"]})
        );
    }
}
