//! Error types for fishlog.
//!
//! This module defines the error type shared by the storage backends,
//! configuration loading, the analysis builders and the pre-trip check.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for fishlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Reading or writing the sheet file failed.
    #[error("sheet error in {path}: {source}")]
    Sheet {
        /// Path to the sheet file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: csv::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// No spot with this name is configured.
    #[error("unknown spot '{0}'")]
    UnknownSpot(String),

    // === Input Errors ===
    /// A user-supplied value could not be used.
    #[error("invalid {field}: {message}")]
    InvalidInput {
        /// The field that was rejected.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    // === External Services ===
    /// A tide, weather or image-host call failed.
    #[error(transparent)]
    Forecast(#[from] fishlog_forecast::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A photo file could not be read.
    #[error("failed to read photo {path}: {source}")]
    PhotoRead {
        /// Path given for the photo.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for fishlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid-input error.
    #[must_use]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

}
