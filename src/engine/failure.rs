//! Handler failures and the JSON error envelope.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The error half of a handler's result.
///
/// Anything displayable can fail a request; implementors may also carry the
/// HTTP status to respond with. Without one the response is a 500.
pub trait Failure: Display + Send + 'static {
    /// Status code carried by the error, if any.
    fn status_code(&self) -> Option<u16> {
        None
    }

    fn code(&self) -> &str {
        "error"
    }

    fn detail(&self) -> String {
        self.to_string()
    }
}

/// An error with an explicit HTTP status.
///
/// ```
/// use autoroute::engine::{Failure, HttpError};
///
/// let error = HttpError::not_found("no such foo");
/// assert_eq!(error.status_code(), Some(404));
/// assert_eq!(error.to_string(), "no such foo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    pub status: u16,
    pub message: String,
}

impl HttpError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }
}

impl Failure for HttpError {
    fn status_code(&self) -> Option<u16> {
        Some(self.status)
    }
}

impl Failure for String {}

impl Failure for &'static str {}

impl Failure for Box<dyn StdError + Send + Sync> {}

impl Failure for serde_json::Error {}

impl Failure for std::io::Error {}

impl Failure for Infallible {}

/// The JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: u16,
    pub code: String,
    pub message: String,
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: "error".to_string(),
            status,
            code: code.into(),
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Build the envelope for a failure, defaulting the status to 500.
    pub fn from_failure(failure: &dyn Failure) -> Self {
        Self::new(
            failure.status_code().unwrap_or(500),
            failure.code(),
            failure.to_string(),
            failure.detail(),
        )
    }
}
