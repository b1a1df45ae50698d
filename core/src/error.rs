//! Error types for the Tedo API client.
//!
//! # Design
//! Three kinds of failure reach the caller:
//! - `Api`: the server answered with status >= 400. Carries the status code
//!   plus the `{code, message, field}` body. A body that does not parse is
//!   kept as the message under the `unknown_error` code.
//! - `Transport`: the request never produced a response (DNS, connect,
//!   timeout, body read).
//! - `Serialization` / `Deserialization`: JSON encoding of a request or
//!   decoding of a successful response failed.
//!
//! The `is_*` predicates only ever look at `Api` errors, so a timeout can
//! never be mistaken for a missing resource.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::null_as_default;

/// Code used when an error body cannot be parsed.
pub const UNKNOWN_ERROR_CODE: &str = "unknown_error";

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by every `Client` operation.
#[derive(Debug, Error)]
pub enum Error {
    /// The server returned status >= 400.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The HTTP round-trip itself failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A successful response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Client configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The structured API error, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status of an API error; `None` for every other kind.
    pub fn status(&self) -> Option<u16> {
        self.api().map(|e| e.status)
    }

    /// True iff the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.api().is_some_and(ApiError::is_not_found)
    }

    /// True iff the server answered 400.
    pub fn is_validation_error(&self) -> bool {
        self.api().is_some_and(ApiError::is_validation_error)
    }

    /// True iff the server answered 401.
    pub fn is_unauthorized(&self) -> bool {
        self.api().is_some_and(ApiError::is_unauthorized)
    }
}

/// Structured error returned by the API.
///
/// The status code travels out-of-band in the HTTP status line, so it is not
/// part of the JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tedo: {} - {}", self.code, self.message)?;
        if let Some(field) = &self.field {
            write!(f, " (field: {field})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Build an error from a failed response. Never fails: a body that is
    /// not a JSON object becomes the message of an `unknown_error`, and an
    /// object without a `code` keeps whatever else it carried.
    pub fn from_response(status: u16, body: &str) -> Self {
        let mut err = serde_json::from_str::<ApiError>(body).unwrap_or_else(|_| ApiError {
            status,
            code: String::new(),
            message: body.to_string(),
            field: None,
        });
        if err.code.is_empty() {
            err.code = UNKNOWN_ERROR_CODE.to_string();
        }
        err.status = status;
        err
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_validation_error(&self) -> bool {
        self.status == 400
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}
