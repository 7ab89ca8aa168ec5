//! `SQLite` schema definitions for fishlog.
//!
//! This module contains the SQL statements for creating the trip log and
//! the columns each later schema version adds to it.

/// Name of the trip table.
pub const TRIP_TABLE: &str = "fishing_log";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the trip table as it looked in version 1.
pub const CREATE_FISHING_LOG_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS fishing_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT,
    area TEXT,
    tide_type TEXT,
    temperature REAL,
    wind_direction TEXT,
    lure TEXT,
    action TEXT,
    size REAL
)
";

/// SQL statement to create an index on date for the default ordering.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_fishing_log_date ON fishing_log(date DESC)
";

/// Columns added in version 2.
pub const V2_COLUMNS: &[(&str, &str)] = &[("time", "TEXT"), ("tide_height", "REAL")];

/// Columns added in version 3.
pub const V3_COLUMNS: &[(&str, &str)] = &[
    ("image_url1", "TEXT"),
    ("image_url2", "TEXT"),
    ("image_url3", "TEXT"),
];

/// Column list used by every trip query, in `row_to_trip` order.
pub const TRIP_COLUMNS: &str = "id, date, time, area, tide_type, tide_height, temperature, \
     wind_direction, lure, action, size, image_url1, image_url2, image_url3";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_fishing_log_table_contains_base_columns() {
        for column in [
            "id INTEGER PRIMARY KEY",
            "date TEXT",
            "tide_type TEXT",
            "size REAL",
        ] {
            assert!(CREATE_FISHING_LOG_TABLE.contains(column), "missing {column}");
        }
        assert!(!CREATE_FISHING_LOG_TABLE.contains("image_url1"));
    }

    #[test]
    fn test_trip_columns_cover_every_version() {
        for (name, _) in V2_COLUMNS.iter().chain(V3_COLUMNS) {
            assert!(TRIP_COLUMNS.contains(name), "missing {name}");
        }
        assert_eq!(TRIP_COLUMNS.split(',').count(), 14);
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
