// Prevents the logging macros from being shadowed by stray prints
#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::sync::Arc;

use dirview_lib::config::ServerConfig;
use dirview_lib::file_system::ListingService;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dirview_lib::init_logging();

    let config = ServerConfig::from_env();
    log::info!(
        "Starting dirview (mode={:?}, cache_ttl={}s, max_cache_entries={}, max_watchers={})",
        config.listing.runtime_mode,
        config.listing.cache_ttl.as_secs(),
        config.listing.max_cache_entries,
        config.listing.max_watchers
    );

    let service = Arc::new(ListingService::new(config.listing.clone()));
    let result = dirview_lib::server::serve(&config, Arc::clone(&service), shutdown_signal()).await;

    service.shutdown();
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
