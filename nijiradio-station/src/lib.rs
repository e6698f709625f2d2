//! # NijiRadio Station Library (nijiradio-station)
//!
//! Shared-listening radio: one authoritative station per name holds a
//! playlist and pushes synchronized playback position to every listener.
//!
//! **Architecture:**
//! - [`db::checkpoint`]: durable `{playlist, currentTrackIndex, startTime}` triple
//! - [`playback`]: the sync engine, its single outstanding deadline, and the
//!   station directory that routes a name to exactly one engine
//! - [`push`]: fan-out of events to live push connections
//! - [`api`]: HTTP admin commands and the WebSocket gateway

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod playback;
pub mod push;

pub use error::{Error, Result};
