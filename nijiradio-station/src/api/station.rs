//! Station extractors
//!
//! Routes either carry a `:station` path parameter or address the
//! configured default station. Read-only traffic (listeners, inspection)
//! only reaches stations that already exist; new stations come into being
//! through admin commands.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::server::AppContext;
use crate::error::Error;
use crate::playback::SyncEngine;

/// Name of the station a request is addressed to, not yet resolved
pub struct StationName(pub String);

#[async_trait]
impl FromRequestParts<AppContext> for StationName {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppContext) -> Result<Self, Self::Rejection> {
        let named = Path::<HashMap<String, String>>::from_request_parts(parts, ctx)
            .await
            .ok()
            .and_then(|Path(params)| params.get("station").cloned());

        Ok(StationName(named.unwrap_or_else(|| ctx.default_station.clone())))
    }
}

/// An existing station (the default station always exists)
pub struct Station(pub Arc<SyncEngine>);

#[async_trait]
impl FromRequestParts<AppContext> for Station {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppContext) -> Result<Self, Self::Rejection> {
        let StationName(name) = StationName::from_request_parts(parts, ctx).await?;
        let engine = if name == ctx.default_station {
            ctx.stations.get(&name)?
        } else {
            ctx.stations.find(&name)?
        };
        Ok(Station(engine))
    }
}
