//! # NijiRadio Common Library
//!
//! Shared code for the NijiRadio station server and its tooling:
//! - Playlist data model and rotation policy
//! - Push event types (StationEvent / ClientMessage)
//! - Configuration loading
//! - Database initialization
//! - Time utilities

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod playlist;
pub mod time;

pub use error::{Error, Result};
pub use events::{ClientMessage, StationEvent};
pub use playlist::{PlaylistState, Track, ROTATION_THRESHOLD};
pub use time::{Clock, SystemClock};
