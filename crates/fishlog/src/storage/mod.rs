//! Storage layer for fishlog.
//!
//! Trips live either in a local `SQLite` database or in a spreadsheet-style
//! CSV file. Both sit behind [`LogStore`], so every command works the same
//! against either backend.

pub mod migrations;
pub mod schema;
pub mod sheet;
pub mod sqlite;

use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::info;

use crate::config::{Backend, Config};
use crate::error::Result;
use crate::trip::{NewTrip, TripLog, TripUpdate};

pub use sheet::SheetStore;
pub use sqlite::SqliteStore;

/// Operations every trip store supports.
pub trait LogStore: Send {
    /// Which backend this is.
    fn backend(&self) -> Backend;

    /// Location of the backing file.
    fn path(&self) -> &Path;

    /// Every trip, newest date first (ties by id, highest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn fetch_all(&self) -> Result<Vec<TripLog>>;

    /// One trip by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, id: i64) -> Result<Option<TripLog>>;

    /// Add a trip and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the trip is invalid or the write fails.
    fn insert(&mut self, trip: &NewTrip) -> Result<i64>;

    /// Rewrite the editable fields of trip `id`, keeping its date.
    ///
    /// Returns `false` without touching the store if `id` is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is invalid or the write fails.
    fn update(&mut self, id: i64, update: &TripUpdate) -> Result<bool>;

    /// Remove trip `id`.
    ///
    /// Returns `false` if `id` is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn delete(&mut self, id: i64) -> Result<bool>;

    /// Summary numbers for `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn stats(&self) -> Result<StorageStats>;
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of trips.
    pub total_trips: usize,
    /// Trips with a catch.
    pub catches: usize,
    /// Earliest parseable trip date.
    pub first_date: Option<NaiveDate>,
    /// Latest parseable trip date.
    pub last_date: Option<NaiveDate>,
    /// Size of the backing file in bytes.
    pub size_bytes: u64,
}

impl StorageStats {
    /// Compute stats from loaded trips.
    #[must_use]
    pub fn from_trips(trips: &[TripLog], size_bytes: u64) -> Self {
        let dates = trips.iter().filter_map(|t| t.date);
        Self {
            total_trips: trips.len(),
            catches: trips.iter().filter(|t| t.caught()).count(),
            first_date: dates.clone().min(),
            last_date: dates.max(),
            size_bytes,
        }
    }
}

/// Open the store selected by `config.storage.backend`.
///
/// # Errors
///
/// Returns an error if the backing file cannot be opened or created.
pub fn open_store(config: &Config) -> Result<Box<dyn LogStore>> {
    let store: Box<dyn LogStore> = match config.storage.backend {
        Backend::Sqlite => Box::new(SqliteStore::open(config.database_path())?),
        Backend::Sheet => Box::new(SheetStore::open(config.sheet_path())?),
    };
    info!(backend = %store.backend(), path = %store.path().display(), "store opened");
    Ok(store)
}

/// Sort newest date first, then highest id; undated rows go last.
pub(crate) fn sort_newest_first(trips: &mut [TripLog]) {
    trips.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x).then(b.id.cmp(&a.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => b.id.cmp(&a.id),
    });
}

/// Size of `path` on disk, 0 if it cannot be read.
pub(crate) fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Text form of a date cell.
pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Text form of a time cell.
pub(crate) fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Parse a stored date, accepting `-` or `/` separators.
pub(crate) fn parse_stored_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y/%m/%d"))
        .ok()
}

/// Parse a stored time, with or without seconds.
pub(crate) fn parse_stored_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
}

/// Parse a numeric cell; blank or malformed text is absent.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Text form of a numeric cell.
pub(crate) fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
