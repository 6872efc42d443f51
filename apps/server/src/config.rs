//! Service configuration.
//!
//! Priority: environment variables > defaults. Values that fail to parse fall back to the
//! default instead of aborting startup.

use std::env;
use std::time::Duration;

use crate::file_system::RuntimeMode;

/// Default time-to-live for cached directory name lists (30 seconds).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;
/// Default maximum number of cached directories.
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 100;
/// Default maximum number of concurrently watched directories.
pub const DEFAULT_MAX_WATCHERS: usize = 20;
/// Default number of accesses after which a directory gets a change watch.
pub const DEFAULT_WATCH_PROMOTION_THRESHOLD: u64 = 3;
/// Default debounce window for change events, in milliseconds.
pub const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 50;
/// Default mount root used when running inside a container.
pub const DEFAULT_MOUNT_ROOT: &str = "/host";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 4000;
/// Default bind address.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Tunables for the listing core: cache, watcher and path translation.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    /// How long a cached name list stays valid.
    pub cache_ttl: Duration,
    /// Upper bound on cached directories. The oldest entry is evicted when full.
    pub max_cache_entries: usize,
    /// Upper bound on active change watches. The first-registered watch is evicted when full.
    pub max_watchers: usize,
    /// Access count at which a directory is promoted to a change watch.
    pub watch_promotion_threshold: u64,
    /// Debounce window for change events.
    pub watch_debounce: Duration,
    /// Whether client paths need host-to-container rewriting.
    pub runtime_mode: RuntimeMode,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            max_watchers: DEFAULT_MAX_WATCHERS,
            watch_promotion_threshold: DEFAULT_WATCH_PROMOTION_THRESHOLD,
            watch_debounce: Duration::from_millis(DEFAULT_WATCH_DEBOUNCE_MS),
            runtime_mode: RuntimeMode::Native,
        }
    }
}

impl ListingConfig {
    /// Load listing configuration from environment variables, using defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes `std::env::var`;
    /// tests pass a map so they don't race on the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let cache_ttl = parse_var(&lookup, "DIRVIEW_CACHE_TTL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);
        let max_cache_entries = parse_var(&lookup, "DIRVIEW_MAX_CACHE_ENTRIES")
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_cache_entries);
        let max_watchers = parse_var(&lookup, "DIRVIEW_MAX_WATCHERS")
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_watchers);
        let watch_promotion_threshold = parse_var(&lookup, "DIRVIEW_WATCH_THRESHOLD")
            .filter(|n: &u64| *n > 0)
            .unwrap_or(defaults.watch_promotion_threshold);

        let mount_root = lookup("DIRVIEW_MOUNT_ROOT").unwrap_or_else(|| DEFAULT_MOUNT_ROOT.to_string());
        let runtime_mode = match lookup("DIRVIEW_RUNTIME_MODE").as_deref() {
            Some("container") | Some("containerized") | Some("docker") => RuntimeMode::Containerized { mount_root },
            Some("native") | None => RuntimeMode::Native,
            Some(other) => {
                log::warn!("Unknown DIRVIEW_RUNTIME_MODE '{}', using native", other);
                RuntimeMode::Native
            }
        };

        Self {
            cache_ttl,
            max_cache_entries,
            max_watchers,
            watch_promotion_threshold,
            watch_debounce: defaults.watch_debounce,
            runtime_mode,
        }
    }
}

/// Configuration for the HTTP server process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    pub listing: ListingConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("DIRVIEW_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_var(&lookup, "DIRVIEW_PORT").unwrap_or(DEFAULT_PORT);

        Self {
            host,
            port,
            listing: ListingConfig::from_lookup(lookup),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}
