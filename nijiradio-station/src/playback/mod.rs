//! Station playback coordination
//!
//! - [`engine::SyncEngine`]: playlist state machine with one self-driving deadline
//! - [`deadline::Deadline`]: the single-shot timer behind that deadline
//! - [`directory::StationDirectory`]: routes a station name to its one engine

pub mod deadline;
pub mod directory;
pub mod engine;

pub use directory::StationDirectory;
pub use engine::SyncEngine;
