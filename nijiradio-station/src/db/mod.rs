//! Database access layer
//!
//! Station checkpoints live in the `station_state` key/value table.

pub mod checkpoint;

pub use checkpoint::{load_checkpoint, save_checkpoint, SqliteStore, StateStore};
