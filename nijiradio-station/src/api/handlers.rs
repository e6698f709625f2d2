//! Admin command and inspection handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use nijiradio_common::playlist::validate_tracks;
use nijiradio_common::{PlaylistState, Track};
use serde::Serialize;
use tracing::{debug, info};

use super::server::AppContext;
use super::station::{Station, StationName};
use crate::error::{Error, Result};

const INVALID_PLAYLIST: &str = "Invalid playlist format";
const INVALID_CONTENT_TYPE: &str = "Invalid content type";

/// Build identification, captured by build.rs
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub git_hash: &'static str,
    pub timestamp: &'static str,
    pub profile: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub build: BuildInfo,
    pub default_station: String,
    pub stations: Vec<String>,
    pub uptime_seconds: i64,
}

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: "nijiradio-station",
        version: env!("CARGO_PKG_VERSION"),
        build: BuildInfo {
            git_hash: env!("GIT_HASH"),
            timestamp: env!("BUILD_TIMESTAMP"),
            profile: env!("BUILD_PROFILE"),
        },
        default_station: ctx.default_station.clone(),
        stations: ctx.stations.names(),
        uptime_seconds: (chrono::Utc::now() - ctx.started_at).num_seconds(),
    })
}

/// POST /api/setPlaylist - append tracks
///
/// Creates the addressed station if it does not exist yet.
pub async fn set_playlist(
    State(ctx): State<AppContext>,
    StationName(name): StationName,
    payload: std::result::Result<Json<Vec<Track>>, JsonRejection>,
) -> Result<&'static str> {
    let tracks = track_list(payload)?;
    validate_tracks(&tracks).map_err(|e| playlist_error(e.into()))?;
    let engine = ctx.stations.get(&name)?;
    info!("Station '{}': add {} tracks", engine.name(), tracks.len());
    engine.add(tracks).await.map_err(playlist_error)?;
    Ok("Tracks added to playlist")
}

/// POST /api/replacePlaylist
///
/// Creates the addressed station if it does not exist yet.
pub async fn replace_playlist(
    State(ctx): State<AppContext>,
    StationName(name): StationName,
    payload: std::result::Result<Json<Vec<Track>>, JsonRejection>,
) -> Result<&'static str> {
    let tracks = track_list(payload)?;
    validate_tracks(&tracks).map_err(|e| playlist_error(e.into()))?;
    let engine = ctx.stations.get(&name)?;
    info!("Station '{}': replace with {} tracks", engine.name(), tracks.len());
    engine.replace(tracks).await.map_err(playlist_error)?;
    Ok("Playlist replaced")
}

/// POST /api/clearPlaylist
pub async fn clear_playlist(Station(engine): Station) -> Result<&'static str> {
    info!("Station '{}': clear", engine.name());
    engine.clear().await?;
    Ok("Playlist cleared")
}

/// Track as listed by `GET /api/getPlaylist`
#[derive(Debug, Serialize)]
pub struct TrackEntry {
    pub url: String,
    pub duration: u64,
}

/// GET /api/getPlaylist - the tracks in play order
pub async fn get_playlist(Station(engine): Station) -> Result<Json<Vec<TrackEntry>>> {
    let state = engine.playlist().await?;
    let tracks = state
        .tracks
        .into_iter()
        .map(|track| TrackEntry {
            url: track.url,
            duration: track.duration_ms,
        })
        .collect();
    Ok(Json(tracks))
}

/// GET /api/getPlaylistState - tracks plus position and anchor time
pub async fn get_playlist_state(Station(engine): Station) -> Result<Json<PlaylistState>> {
    Ok(Json(engine.playlist().await?))
}

/// Unpack a JSON track array, turning body problems into 400s
fn track_list(payload: std::result::Result<Json<Vec<Track>>, JsonRejection>) -> Result<Vec<Track>> {
    match payload {
        Ok(Json(tracks)) => Ok(tracks),
        Err(JsonRejection::MissingJsonContentType(_)) => {
            Err(Error::BadRequest(INVALID_CONTENT_TYPE.to_string()))
        }
        Err(rejection) => {
            debug!("Rejected playlist body: {}", rejection.body_text());
            Err(Error::BadRequest(INVALID_PLAYLIST.to_string()))
        }
    }
}

/// Tracks that parsed but cannot be scheduled get the same reply as bad JSON
fn playlist_error(err: Error) -> Error {
    match err {
        Error::BadRequest(detail) => {
            debug!("Rejected playlist: {}", detail);
            Error::BadRequest(INVALID_PLAYLIST.to_string())
        }
        other => other,
    }
}
