//! `fishlog` - A personal fishing-trip log
//!
//! This library stores fishing trips in a `SQLite` database or a CSV sheet,
//! analyses catch rates by tide, month, lure and tide height, and runs the
//! pre-trip tide and weather check.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod listing;
pub mod logging;
pub mod photos;
pub mod render;
pub mod storage;
pub mod trip;

pub use config::{Backend, Config, Spot};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{open_store, LogStore, SheetStore, SqliteStore, StorageStats};
pub use trip::{NewTrip, PhotoChange, TidePhase, TripLog, TripUpdate};
