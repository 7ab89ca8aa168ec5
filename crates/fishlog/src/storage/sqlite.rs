//! `SQLite` trip store.

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::migrations;
use super::schema::TRIP_COLUMNS;
use super::{
    file_size, format_date, format_time, parse_number, parse_stored_date, parse_stored_time,
    sort_newest_first, LogStore, StorageStats,
};
use crate::config::Backend;
use crate::error::{Error, Result};
use crate::trip::{NewTrip, TidePhase, TripLog, TripUpdate, PHOTO_SLOTS};

/// Trip store backed by a local `SQLite` database.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Convert a database row to a trip.
    fn row_to_trip(row: &rusqlite::Row) -> rusqlite::Result<TripLog> {
        let id: i64 = row.get(0)?;
        let date_text = value_text(row.get(1)?);
        let time_text = value_text(row.get(2)?);

        let date = parse_stored_date(&date_text);
        if date.is_none() {
            warn!(id, date = %date_text, "trip has an unparseable date");
        }
        let time = if time_text.trim().is_empty() {
            None
        } else {
            let time = parse_stored_time(&time_text);
            if time.is_none() {
                warn!(id, time = %time_text, "trip has an unparseable time");
            }
            time
        };

        let mut photos: [Option<String>; PHOTO_SLOTS] = Default::default();
        for (i, slot) in photos.iter_mut().enumerate() {
            let url = value_text(row.get(11 + i)?);
            *slot = Some(url).filter(|u| !u.trim().is_empty());
        }

        Ok(TripLog {
            id,
            date,
            time,
            area: value_text(row.get(3)?),
            tide_phase: TidePhase::from_stored(&value_text(row.get(4)?)),
            tide_height: value_number(row.get(5)?),
            temperature: value_number(row.get(6)?),
            wind_direction: value_text(row.get(7)?),
            lure: value_text(row.get(8)?),
            action: value_text(row.get(9)?),
            size: value_number(row.get(10)?),
            photos,
        })
    }
}

/// Read any column as text; NULL is empty.
fn value_text(value: Value) -> String {
    match value {
        Value::Null | Value::Blob(_) => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
    }
}

/// Read any column as a number; text is parsed leniently.
#[allow(clippy::cast_precision_loss)]
fn value_number(value: Value) -> Option<f64> {
    match value {
        Value::Null | Value::Blob(_) => None,
        Value::Integer(i) => Some(i as f64),
        Value::Real(f) => Some(f),
        Value::Text(s) => parse_number(&s),
    }
}

impl LogStore for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn fetch_all(&self) -> Result<Vec<TripLog>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TRIP_COLUMNS} FROM fishing_log"))?;
        let mut trips = stmt
            .query_map([], Self::row_to_trip)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        sort_newest_first(&mut trips);
        debug!(count = trips.len(), "trips loaded");
        Ok(trips)
    }

    fn get(&self, id: i64) -> Result<Option<TripLog>> {
        let trip = self
            .conn
            .query_row(
                &format!("SELECT {TRIP_COLUMNS} FROM fishing_log WHERE id = ?1"),
                [id],
                Self::row_to_trip,
            )
            .optional()?;
        Ok(trip)
    }

    fn insert(&mut self, trip: &NewTrip) -> Result<i64> {
        let trip = trip.clone().normalized()?;
        let [photo1, photo2, photo3] = trip.photos;

        self.conn.execute(
            r"
            INSERT INTO fishing_log (
                date, time, area, tide_type, tide_height, temperature,
                wind_direction, lure, action, size, image_url1, image_url2, image_url3
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
            params![
                format_date(trip.date),
                trip.time.map(format_time),
                trip.area,
                trip.tide_phase.label(),
                trip.tide_height,
                trip.temperature,
                trip.wind_direction,
                trip.lure,
                trip.action,
                trip.size,
                photo1,
                photo2,
                photo3,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted trip with id {}", id);
        Ok(id)
    }

    fn update(&mut self, id: i64, update: &TripUpdate) -> Result<bool> {
        let Some(existing) = self.get(id)? else {
            debug!(id, "update skipped, no such trip");
            return Ok(false);
        };
        let update = update.clone().normalized()?;
        let [photo1, photo2, photo3] = update.apply_photos(&existing.photos);

        let affected = self.conn.execute(
            r"
            UPDATE fishing_log SET
                time = ?1, area = ?2, tide_type = ?3, tide_height = ?4,
                temperature = ?5, wind_direction = ?6, lure = ?7, action = ?8,
                size = ?9, image_url1 = ?10, image_url2 = ?11, image_url3 = ?12
            WHERE id = ?13
            ",
            params![
                update.time.map(format_time),
                update.area,
                update.tide_phase.label(),
                update.tide_height,
                update.temperature,
                update.wind_direction,
                update.lure,
                update.action,
                update.size,
                photo1,
                photo2,
                photo3,
                id,
            ],
        )?;
        debug!(id, "Updated trip");
        Ok(affected > 0)
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM fishing_log WHERE id = ?1", [id])?;
        if affected > 0 {
            info!(id, "Deleted trip");
        }
        Ok(affected > 0)
    }

    fn stats(&self) -> Result<StorageStats> {
        let trips = self.fetch_all()?;
        let size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            file_size(&self.path)
        };
        Ok(StorageStats::from_trips(&trips, size_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::{blank_time, fixtures, PhotoChange};
    use chrono::{NaiveDate, NaiveTime};

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    #[test]
    fn test_open_in_memory() {
        let store = create_test_store();
        assert_eq!(store.fetch_all().unwrap().len(), 0);
        assert_eq!(store.path(), Path::new(":memory:"));
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = create_test_store();
        let mut trip = fixtures::trip("2024-05-01", "若洲", 62.0);
        trip.time = NaiveTime::from_hms_opt(18, 30, 0);
        trip.tide_phase = TidePhase::Major;
        trip.tide_height = Some(130.0);
        trip.temperature = Some(21.5);
        trip.wind_direction = "北東".to_string();
        trip.lure = "ミノー".to_string();
        trip.action = "ただ巻き".to_string();
        trip.photos[0] = Some("https://img/1.jpg".to_string());
        trip.photos[2] = Some("https://img/3.jpg".to_string());

        let id = store.insert(&trip).unwrap();
        let stored = store.get(id).unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(stored.time, NaiveTime::from_hms_opt(18, 30, 0));
        assert_eq!(stored.area, "若洲");
        assert_eq!(stored.tide_phase, TidePhase::Major);
        assert_eq!(stored.tide_height, Some(130.0));
        assert_eq!(stored.temperature, Some(21.5));
        assert_eq!(stored.wind_direction, "北東");
        assert_eq!(stored.lure, "ミノー");
        assert_eq!(stored.action, "ただ巻き");
        assert_eq!(stored.size, Some(62.0));
        assert_eq!(stored.photos[0].as_deref(), Some("https://img/1.jpg"));
        assert_eq!(stored.photos[1], None);
        assert_eq!(stored.photos[2].as_deref(), Some("https://img/3.jpg"));
    }

    #[test]
    fn test_insert_without_time_stores_blank_time() {
        let mut store = create_test_store();
        let id = store.insert(&fixtures::trip("2024-05-01", "若洲", 0.0)).unwrap();

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.time, Some(blank_time()));
        let raw: String = store
            .conn
            .query_row("SELECT time FROM fishing_log WHERE id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(raw, "00:00");
    }

    #[test]
    fn test_get_nonexistent() {
        let store = create_test_store();
        assert!(store.get(99).unwrap().is_none());
    }

    #[test]
    fn test_fetch_all_order() {
        let mut store = create_test_store();
        let a = store.insert(&fixtures::trip("2024-01-01", "a", 0.0)).unwrap();
        let b = store.insert(&fixtures::trip("2024-03-01", "b", 0.0)).unwrap();
        let c = store.insert(&fixtures::trip("2024-01-01", "c", 0.0)).unwrap();

        let ids: Vec<i64> = store.fetch_all().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b, c, a]);
    }

    #[test]
    fn test_update_keeps_date_and_applies_photos() {
        let mut store = create_test_store();
        let mut trip = fixtures::trip("2024-05-01", "若洲", 0.0);
        trip.photos = [
            Some("https://img/1.jpg".to_string()),
            Some("https://img/2.jpg".to_string()),
            None,
        ];
        let id = store.insert(&trip).unwrap();
        let existing = store.get(id).unwrap().unwrap();

        let mut update = TripUpdate::from_existing(&existing);
        update.area = "豊洲".to_string();
        update.size = Some(48.5);
        update.time = NaiveTime::from_hms_opt(19, 15, 0);
        update.photos = [
            PhotoChange::Clear,
            PhotoChange::Keep,
            PhotoChange::Set("https://img/3.jpg".to_string()),
        ];

        assert!(store.update(id, &update).unwrap());
        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(stored.area, "豊洲");
        assert_eq!(stored.size, Some(48.5));
        assert_eq!(stored.time, NaiveTime::from_hms_opt(19, 15, 0));
        assert_eq!(stored.photos[0], None);
        assert_eq!(stored.photos[1].as_deref(), Some("https://img/2.jpg"));
        assert_eq!(stored.photos[2].as_deref(), Some("https://img/3.jpg"));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = create_test_store();
        store.insert(&fixtures::trip("2024-05-01", "若洲", 0.0)).unwrap();
        let before = store.fetch_all().unwrap();

        let update = TripUpdate::from_existing(&before[0]);
        assert!(!store.update(999, &update).unwrap());
        assert_eq!(store.fetch_all().unwrap(), before);
    }

    #[test]
    fn test_delete() {
        let mut store = create_test_store();
        let a = store.insert(&fixtures::trip("2024-05-01", "a", 0.0)).unwrap();
        let b = store.insert(&fixtures::trip("2024-05-02", "b", 0.0)).unwrap();

        assert!(store.delete(a).unwrap());
        assert_eq!(store.fetch_all().unwrap().len(), 1);
        assert!(store.get(b).unwrap().is_some());
    }

    #[test]
    fn test_delete_nonexistent() {
        let mut store = create_test_store();
        assert!(!store.delete(42).unwrap());
    }

    #[test]
    fn test_unparseable_date_still_returned() {
        crate::logging::init_test_logging();
        let store = create_test_store();
        store
            .conn
            .execute(
                "INSERT INTO fishing_log (date, area, size, tide_type) VALUES ('someday', 'x', '12', 'odd')",
                [],
            )
            .unwrap();

        let trips = store.fetch_all().unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].date, None);
        assert_eq!(trips[0].size, Some(12.0));
        assert_eq!(trips[0].tide_phase, TidePhase::Unknown);
    }

    #[test]
    fn test_stats_with_data() {
        let mut store = create_test_store();
        store.insert(&fixtures::trip("2024-05-01", "a", 30.0)).unwrap();
        store.insert(&fixtures::trip("2024-06-01", "a", 0.0)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_trips, 2);
        assert_eq!(stats.catches, 1);
        assert_eq!(stats.last_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(stats.size_bytes, 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/deeper/log.db");

        let mut store = SqliteStore::open(&nested).unwrap();
        store.insert(&fixtures::trip("2024-05-01", "a", 0.0)).unwrap();

        assert!(nested.exists());
        assert_eq!(store.path(), nested);
        assert!(store.stats().unwrap().size_bytes > 0);
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.insert(&fixtures::trip("2024-05-01", "a", 10.0)).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.fetch_all().unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_negative_size() {
        let mut store = create_test_store();
        let result = store.insert(&fixtures::trip("2024-05-01", "a", -1.0));
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }
}
