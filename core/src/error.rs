//! Error types for the Quinyx API client.
//!
//! # Design
//! Failures fall into four kinds that callers handle differently:
//! `Validation` (bad input, nothing was sent), `Transport` (no interpretable
//! response), `Api` (the server answered with a non-2xx status) and `Decode`
//! (the body did not have the expected shape, even on a 2xx). `Api` and
//! `Decode` both carry the server-supplied request UID so it can be quoted
//! to Quinyx support.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum Error {
    /// The call was rejected before any request was built.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The transport failed without producing a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server returned a non-2xx status.
    #[error("API error {status} (request uid {request_uid:?}): {message}")]
    Api {
        status: u16,
        request_uid: String,
        message: String,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("failed to decode response (request uid {request_uid:?}): {source}")]
    Decode {
        request_uid: String,
        #[source]
        source: DecodeError,
    },

    /// The configured base URL is unusable.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A request path or path segment could not be resolved against the
    /// base URL.
    #[error("invalid request path {0:?}")]
    InvalidPath(String),

    /// The request body could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// An environment setting could not be parsed.
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

impl Error {
    /// Correlation identifier of the failed call, if the server answered.
    ///
    /// Empty when the server answered without one.
    pub fn request_uid(&self) -> Option<&str> {
        match self {
            Error::Api { request_uid, .. } | Error::Decode { request_uid, .. } => {
                Some(request_uid.as_str())
            }
            _ => None,
        }
    }

    /// HTTP status of the failed call, for `Api` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Input rejected client-side, before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The options were absent or missing a required field.
    #[error("required fields in the options not provided")]
    RequiredFieldsMissing,

    #[error("the range between start time and end time is {days} days, above the limit of {max}")]
    DateRangeTooWide { days: i64, max: i64 },

    #[error("the total amount of data rows must not exceed {max} in a single call (got {rows})")]
    TooManyRows { rows: usize, max: usize },

    /// `update_tag` cannot move a tag to another category.
    #[error("categoryExternalId cannot be changed")]
    CategoryChanged,
}

/// Failures where no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The call context deadline had already passed.
    #[error("deadline exceeded before the request was sent")]
    DeadlineExceeded,

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("transport I/O failed: {0}")]
    Io(String),
}

/// Failures turning wire data into typed values.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Neither epoch seconds nor an RFC 3339 string.
    #[error("malformed timestamp {0:?}")]
    MalformedTimestamp(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
