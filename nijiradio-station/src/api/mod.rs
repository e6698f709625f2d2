//! HTTP and WebSocket surface of the station server
//!
//! Admin commands (`/api/*`) and the push gateway (`/music`) for the
//! default station, mirrored under `/stations/:station/` for named ones.

pub mod gateway;
pub mod handlers;
pub mod server;
pub mod station;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::error::Error;

pub use server::{create_router, serve, AppContext};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            Error::BadRequest(msg) | Error::NotFound(msg) => msg,
            other => {
                error!("Request failed: {}", other);
                other.to_string()
            }
        };
        (status, body).into_response()
    }
}
