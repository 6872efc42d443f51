//! HTTP transport for the listing service.
//!
//! A thin JSON layer: every handler forwards to `ListingService` and serializes whatever it
//! returns. Listing failures travel inside `DirectoryResult::error` with a 200 status.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::file_system::{CacheStats, DirectoryResult, ListingRequest, ListingService, WatcherStats};

type SharedService = Arc<ListingService>;

/// Builds the router with all routes and a permissive CORS layer.
pub fn router(service: SharedService) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/directory-listing", post(handle_directory_listing))
        .route("/cache-stats", get(handle_cache_stats))
        .route("/watcher-stats", get(handle_watcher_stats))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(service)
}

/// Binds to the configured address and serves until `shutdown` resolves.
pub async fn serve(
    config: &ServerConfig,
    service: SharedService,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .inspect_err(|e| log::error!("Failed to bind to {}: {}", addr, e))?;
    serve_on(listener, service, shutdown).await
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve_on(
    listener: TcpListener,
    service: SharedService,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Directory listing server listening on http://{}", addr);
    }
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .inspect_err(|e| log::error!("Server error: {}", e))?;
    log::info!("Server stopped");
    Ok(())
}

async fn handle_directory_listing(
    State(service): State<SharedService>,
    Json(request): Json<ListingRequest>,
) -> Json<DirectoryResult> {
    Json(service.list_directory(request).await)
}

async fn handle_cache_stats(State(service): State<SharedService>) -> Json<CacheStats> {
    Json(service.cache_stats())
}

async fn handle_watcher_stats(State(service): State<SharedService>) -> Json<WatcherStats> {
    Json(service.watcher_stats())
}

async fn health_check() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}
