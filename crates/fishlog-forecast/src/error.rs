//! Error types for the forecast clients.

use thiserror::Error;

/// Errors raised while talking to an external service.
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be sent or the body could not be read.
    #[error("{service} request failed: {source}")]
    Request {
        /// Which service was being called.
        service: &'static str,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} returned HTTP {status}")]
    Status {
        /// Which service was being called.
        service: &'static str,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not the JSON we expected.
    #[error("{service} response could not be decoded: {message}")]
    Decode {
        /// Which service was being called.
        service: &'static str,
        /// Description of the decoding failure.
        message: String,
    },

    /// The response decoded but lacked the requested data.
    #[error("{service} returned no {what}")]
    MissingData {
        /// Which service was being called.
        service: &'static str,
        /// What was missing.
        what: String,
    },

    /// The client is not configured well enough to make the call.
    #[error("{service} is not configured: {message}")]
    NotConfigured {
        /// Which service was being called.
        service: &'static str,
        /// What is missing.
        message: String,
    },

    /// Reading a local file (e.g. a photo) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for forecast operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a decode error.
    #[must_use]
    pub fn decode(service: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            service,
            message: message.into(),
        }
    }

    /// Create a missing-data error.
    #[must_use]
    pub fn missing(service: &'static str, what: impl Into<String>) -> Self {
        Self::MissingData {
            service,
            what: what.into(),
        }
    }

    /// Create a not-configured error.
    #[must_use]
    pub fn not_configured(service: &'static str, message: impl Into<String>) -> Self {
        Self::NotConfigured {
            service,
            message: message.into(),
        }
    }
}
