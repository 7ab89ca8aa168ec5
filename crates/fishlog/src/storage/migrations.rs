//! Database migration system for fishlog.
//!
//! Databases created by older releases, or altered by hand, are brought up
//! to the current schema. Every step tolerates work that has already been
//! done, so a column that exists is never added twice.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

use super::schema::{
    CREATE_DATE_INDEX, CREATE_FISHING_LOG_TABLE, CREATE_METADATA_TABLE, TRIP_TABLE, V2_COLUMNS,
    V3_COLUMNS,
};

/// The current schema version.
pub const CURRENT_VERSION: i32 = 3;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Initialize the database schema.
///
/// Creates the metadata table, runs any pending migrations and makes sure
/// the indexes exist.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let version = get_schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }
    if version < CURRENT_VERSION {
        run_migrations(conn, version)?;
    }

    conn.execute(CREATE_DATE_INDEX, [])?;
    Ok(())
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (fresh or legacy database).
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// Run migrations from the given version to the current version.
fn run_migrations(conn: &Connection, from_version: i32) -> Result<()> {
    let mut current = from_version;

    while current < CURRENT_VERSION {
        current += 1;
        run_migration(conn, current)?;
        set_schema_version(conn, current)?;
        info!(version = current, "schema migrated");
    }

    Ok(())
}

/// Run a specific migration version.
fn run_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => add_missing_columns(conn, V2_COLUMNS),
        3 => add_missing_columns(conn, V3_COLUMNS),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}

/// Migration to version 1: the base trip table.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_FISHING_LOG_TABLE, [])?;
    Ok(())
}

/// Names of the columns currently on `table`.
fn existing_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Add each column of `columns` that the trip table lacks.
fn add_missing_columns(conn: &Connection, columns: &[(&str, &str)]) -> Result<()> {
    let existing = existing_columns(conn, TRIP_TABLE)?;
    for (name, sql_type) in columns {
        if existing.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            continue;
        }
        conn.execute(
            &format!("ALTER TABLE {TRIP_TABLE} ADD COLUMN {name} {sql_type}"),
            [],
        )
        .map_err(|e| Error::DatabaseMigration {
            message: format!("adding column {name}: {e}"),
        })?;
    }
    Ok(())
}
