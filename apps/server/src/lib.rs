// Deny unused code to catch dead code early
#![deny(unused)]
// Warn on unused dependencies
#![warn(unused_crate_dependencies)]
// Warn on redundant path prefixes (e.g., std::path::Path when Path is imported)
#![warn(unused_qualifications)]
// Use log::* macros instead of println!/eprintln! for proper log level control
#![deny(clippy::print_stdout, clippy::print_stderr)]

//noinspection RsUnusedImport
// notify is used through notify-debouncer-full's re-export
use notify as _;

pub mod config;
pub mod file_system;
mod ignore_poison;
pub mod server;

/// Initializes logging. Respects the RUST_LOG env var (default: info).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    if let Err(e) = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init()
    {
        log::warn!("Logger already initialized: {}", e);
    }
}
