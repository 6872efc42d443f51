//! Directory name-list cache and per-directory access counting.
//!
//! The cache holds raw entry names only (what `read_dir` returned, unfiltered and unsorted).
//! Metadata is re-probed on every request, so cached names are never served with stale sizes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use crate::ignore_poison::IgnorePoison;

/// A cached directory enumeration.
struct CacheEntry {
    /// When this entry was inserted. Compared against the TTL.
    created_at: SystemTime,
    /// The directory's mtime as seen before it was enumerated. Any other mtime means the
    /// names may be stale.
    dir_modified: SystemTime,
    /// Bumped on every `put`, so a removal decided outside the lock can't drop a newer entry.
    generation: u64,
    entry_names: Vec<String>,
    /// Raw entry count before metadata probing or filtering.
    total_count: usize,
}

/// Size-bounded, time-boxed cache of directory name lists keyed by resolved path.
///
/// Check-then-delete and evict-then-insert sequences run under one lock acquisition. The
/// staleness stat in `get` runs with the lock released, so a slow filesystem only holds up
/// the request that asked for it.
pub struct DirectoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    next_generation: AtomicU64,
}

/// Snapshot of the cache for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub entries: Vec<CacheEntryStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryStats {
    pub path: String,
    pub count: usize,
    /// Age rounded to the nearest second.
    pub age_seconds: u64,
}

impl DirectoryCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Returns the cached names for `resolved_path` if the entry is still trustworthy.
    ///
    /// The entry is dropped (and `None` returned) when it's older than the TTL, when the
    /// directory's mtime differs from the one recorded before enumeration, or when the
    /// directory can't be stat'ed anymore.
    pub async fn get(&self, resolved_path: &str) -> Option<Vec<String>> {
        let (generation, dir_modified, names) = {
            let mut entries = self.entries.lock_ignore_poison();
            let entry = entries.get(resolved_path)?;

            let age = SystemTime::now().duration_since(entry.created_at).unwrap_or(Duration::ZERO);
            if age > self.ttl {
                log::debug!("Cache expired for {} (age={}ms)", resolved_path, age.as_millis());
                entries.remove(resolved_path);
                return None;
            }
            (entry.generation, entry.dir_modified, entry.entry_names.clone())
        };

        match tokio::fs::metadata(resolved_path).await.and_then(|m| m.modified()) {
            Ok(modified) if modified == dir_modified => Some(names),
            Ok(_) => {
                log::debug!("Cache stale for {}: directory modified since enumeration", resolved_path);
                self.remove_if_generation(resolved_path, generation);
                None
            }
            Err(e) => {
                log::debug!("Cache dropped for {}: {}", resolved_path, e);
                self.remove_if_generation(resolved_path, generation);
                None
            }
        }
    }

    /// Removes the entry only if nobody replaced it since `generation` was read.
    fn remove_if_generation(&self, resolved_path: &str, generation: u64) {
        let mut entries = self.entries.lock_ignore_poison();
        if entries.get(resolved_path).is_some_and(|e| e.generation == generation) {
            entries.remove(resolved_path);
        }
    }

    /// Stores a fresh enumeration. `dir_modified` is the directory's mtime taken before
    /// enumerating. When the cache is full, the oldest entry goes first.
    pub fn put(&self, resolved_path: &str, entry_names: Vec<String>, dir_modified: SystemTime) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock_ignore_poison();

        if !entries.contains_key(resolved_path) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(path, _)| path.clone());
            if let Some(oldest) = oldest {
                log::debug!("Cache full ({} entries), evicting {}", entries.len(), oldest);
                entries.remove(&oldest);
            }
        }

        let total_count = entry_names.len();
        entries.insert(
            resolved_path.to_string(),
            CacheEntry {
                created_at: SystemTime::now(),
                dir_modified,
                generation,
                entry_names,
                total_count,
            },
        );
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock_ignore_poison();
        if !entries.is_empty() {
            log::debug!("Invalidating all {} cached directories", entries.len());
        }
        entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock_ignore_poison().len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock_ignore_poison();
        let now = SystemTime::now();
        let mut stats: Vec<CacheEntryStats> = entries
            .iter()
            .map(|(path, entry)| {
                let age = now.duration_since(entry.created_at).unwrap_or(Duration::ZERO);
                CacheEntryStats {
                    path: path.clone(),
                    count: entry.total_count,
                    age_seconds: (age.as_millis() as u64 + 500) / 1000,
                }
            })
            .collect();
        stats.sort_by(|a, b| a.path.cmp(&b.path));

        CacheStats {
            size: entries.len(),
            entries: stats,
        }
    }
}

// ============================================================================
// Access counting
// ============================================================================

/// Counts how often each resolved directory is listed, to decide when to start watching it.
///
/// Lives for the whole process; keys are directories that were actually visited.
pub struct AccessCounter {
    counts: Mutex<HashMap<String, u64>>,
    threshold: u64,
}

impl AccessCounter {
    pub fn new(threshold: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            threshold: threshold.max(1),
        }
    }

    /// Records one access. Returns true exactly once per path: on the access that reaches the threshold.
    pub fn record_access(&self, resolved_path: &str) -> bool {
        let mut counts = self.counts.lock_ignore_poison();
        let count = counts.entry(resolved_path.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count == self.threshold
    }

    #[cfg(test)]
    pub(crate) fn count(&self, resolved_path: &str) -> u64 {
        self.counts.lock_ignore_poison().get(resolved_path).copied().unwrap_or(0)
    }
}
