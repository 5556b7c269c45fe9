//! Test error types.

use http::{Method, StatusCode};
use thiserror::Error;

/// Errors reported by the test helpers.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed.
    #[error("Request build error: {0}")]
    RequestBuild(#[from] http::Error),

    /// The expected body pattern is not a valid regular expression.
    #[error("Invalid body pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The response body does not match the expected pattern.
    #[error("Expected body {expected} was {actual}")]
    BodyMismatch {
        /// Simplified pattern.
        expected: String,
        /// Actual body.
        actual: String,
    },

    /// The response status is not the expected one.
    #[error("Expected status {expected} was {actual}")]
    StatusMismatch {
        /// Expected status.
        expected: StatusCode,
        /// Actual status.
        actual: StatusCode,
    },

    /// JSON deserialization of the response body failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No route matches the request.
    #[error("No route for {method} {path}")]
    NoRoute {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
    },
}
