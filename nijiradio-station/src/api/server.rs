//! HTTP server setup and routing
//!
//! Every station route exists twice: at the root for the configured
//! default station, and under `/stations/:station` for named ones.

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{gateway, handlers};
use crate::error::{Error, Result};
use crate::playback::StationDirectory;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub stations: Arc<StationDirectory>,
    /// Station served by the un-prefixed routes
    pub default_station: String,
    pub started_at: DateTime<Utc>,
}

impl AppContext {
    pub fn new(stations: Arc<StationDirectory>, default_station: impl Into<String>) -> Self {
        Self {
            stations,
            default_station: default_station.into(),
            started_at: Utc::now(),
        }
    }
}

/// Build the application router
pub fn create_router(ctx: AppContext) -> Router {
    let station_routes = Router::new()
        .route("/music", get(gateway::music_socket))
        .route("/api/setPlaylist", post(handlers::set_playlist))
        .route("/api/replacePlaylist", post(handlers::replace_playlist))
        .route("/api/clearPlaylist", post(handlers::clear_playlist))
        .route("/api/getPlaylist", get(handlers::get_playlist))
        .route("/api/getPlaylistState", get(handlers::get_playlist_state));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(station_routes.clone())
        .nest("/stations/:station", station_routes)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the router on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }

    axum::serve(listener, create_router(ctx))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(e.to_string()))
}
