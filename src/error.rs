use std::fmt;

use thiserror::Error;

use crate::record::RecordError;
use crate::store::StoreError;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for every core operation.
///
/// The excluded HTTP layer renders these through [`Error::kind`] and
/// [`Error::status_code`]; the core never retries and never rolls back.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced restaurant, review, document or coordinate is absent.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Malformed input (rating out of range, empty name, bad page).
    #[error("invalid input: {0}")]
    Validation(String),

    /// The duplicate detector already holds this signature.
    #[error("restaurant already exists: {signature}")]
    Conflict { signature: String },

    /// The weather provider (or another third party) failed or is unreachable.
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    /// A review's stored back-reference does not match the requested restaurant.
    #[error("review {review_id} belongs to restaurant {actual}, not {expected}")]
    IntegrityMismatch {
        review_id: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// The failure taxonomy the HTTP layer maps to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    UpstreamUnavailable,
    IntegrityMismatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::UpstreamUnavailable => "upstream-unavailable",
            ErrorKind::IntegrityMismatch => "integrity-mismatch",
        };
        f.write_str(name)
    }
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Classify this error. Store and record failures surface as upstream failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Upstream(_) | Error::Store(_) | Error::Record(_) => {
                ErrorKind::UpstreamUnavailable
            }
            Error::IntegrityMismatch { .. } => ErrorKind::IntegrityMismatch,
        }
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::UpstreamUnavailable => 503,
            ErrorKind::IntegrityMismatch => 409,
        }
    }
}

#[cfg(feature = "openweather")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}
