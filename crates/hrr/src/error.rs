//! Request error types.
//!
//! Every failure produced by the request pipeline or by a response producer
//! is a [`RequestError`]. It carries two facets:
//!
//! - a short, client-safe [`message`](RequestError::message) that ends up in
//!   the JSON error envelope, and
//! - an optional underlying cause, reachable through
//!   [`std::error::Error::source`], that is only ever written to the log sink.

use http::StatusCode;
use std::fmt;

/// Boxed error used as the loggable cause of a [`RequestError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using [`RequestError`].
pub type RequestResult<T> = Result<T, RequestError>;

/// Status written for every error response.
pub const ERROR_STATUS: StatusCode = StatusCode::BAD_REQUEST;

/// Classification of a [`RequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The authentication predicate rejected the caller or failed.
    Authentication,
    /// The request body could not be read.
    BodyRead,
    /// The request body is not valid JSON for the decode target.
    Decode,
    /// One or more fields of the decoded body violate their constraints.
    Validation,
    /// A registered parameter is missing or not a base-10 integer.
    Param,
    /// A parameter source has no registered adapter.
    UnsupportedSource,
    /// Error produced by handler code (e.g. a response producer).
    Handler,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::BodyRead => write!(f, "body-read"),
            Self::Decode => write!(f, "decode"),
            Self::Validation => write!(f, "validation"),
            Self::Param => write!(f, "param"),
            Self::UnsupportedSource => write!(f, "unsupported-source"),
            Self::Handler => write!(f, "handler"),
        }
    }
}

/// Error returned by [`RequestPipeline::process`](crate::RequestPipeline::process)
/// and accepted by [`ResponseWriter::write_error`](crate::ResponseWriter::write_error).
///
/// `Display` renders the client-safe message only. The cause is kept apart
/// so it can never leak into a response body by accident.
///
/// # Example
///
/// ```rust
/// use hrr::{ErrorKind, RequestError};
///
/// let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset by peer");
/// let err = RequestError::new("monster could not be stored", io);
///
/// assert_eq!(err.kind(), ErrorKind::Handler);
/// assert_eq!(err.message(), "monster could not be stored");
/// assert!(!err.to_string().contains("connection reset"));
/// assert!(err.cause().unwrap().to_string().contains("connection reset"));
/// ```
#[derive(Debug)]
pub struct RequestError {
    kind: ErrorKind,
    message: String,
    cause: Option<BoxError>,
}

impl RequestError {
    /// Creates a handler error with a client-safe message and a loggable cause.
    #[must_use]
    pub fn new(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            kind: ErrorKind::Handler,
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Creates a handler error that has no underlying cause.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Handler,
            message: message.into(),
            cause: None,
        }
    }

    pub(crate) fn authentication(user: &str, cause: Option<BoxError>) -> Self {
        Self {
            kind: ErrorKind::Authentication,
            message: format!("Unauthorized user {user}"),
            cause,
        }
    }

    pub(crate) fn body_read(cause: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::BodyRead,
            message: "cannot read request body".to_string(),
            cause: Some(Box::new(cause)),
        }
    }

    pub(crate) fn decode(cause: serde_json::Error) -> Self {
        Self {
            kind: ErrorKind::Decode,
            message: "cannot parse JSON body".to_string(),
            cause: Some(Box::new(cause)),
        }
    }

    pub(crate) fn validation(errors: crate::ValidationErrors) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: errors.to_string(),
            cause: Some(Box::new(errors)),
        }
    }

    pub(crate) fn param(name: &str, cause: impl Into<BoxError>) -> Self {
        Self {
            kind: ErrorKind::Param,
            message: format!("cannot find int64 parameter {name}"),
            cause: Some(cause.into()),
        }
    }

    pub(crate) fn unsupported_source(cause: crate::source::UnsupportedSource) -> Self {
        Self {
            kind: ErrorKind::UnsupportedSource,
            message: "unsupported parameter source".to_string(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the client-safe message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the underlying cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Returns the text that is written to the log for this error.
    ///
    /// This is the cause when one exists, otherwise the message.
    #[must_use]
    pub fn log_text(&self) -> String {
        self.cause
            .as_ref()
            .map_or_else(|| self.message.clone(), ToString::to_string)
    }

    /// Returns the HTTP status code used for error responses.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        ERROR_STATUS
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_new_keeps_cause_out_of_message() {
        let err = RequestError::new("X-Men are cool", "Who is this girl Wolverine");

        assert_eq!(err.kind(), ErrorKind::Handler);
        assert_eq!(err.message(), "X-Men are cool");
        assert_eq!(err.to_string(), "X-Men are cool");
        assert_eq!(err.log_text(), "Who is this girl Wolverine");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_message_logs_message() {
        let err = RequestError::from_message("nothing to see");

        assert!(err.cause().is_none());
        assert!(err.source().is_none());
        assert_eq!(err.log_text(), "nothing to see");
    }

    #[test]
    fn test_authentication_message() {
        let err = RequestError::authentication("alice", None);

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "Unauthorized user alice");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_decode_message_is_fixed() {
        let cause = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = RequestError::decode(cause);

        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.message(), "cannot parse JSON body");
        assert_ne!(err.log_text(), err.message());
    }

    #[test]
    fn test_param_message_names_parameter() {
        let cause = "abc".parse::<i64>().unwrap_err();
        let err = RequestError::param("monster_id", cause);

        assert_eq!(err.kind(), ErrorKind::Param);
        assert_eq!(err.message(), "cannot find int64 parameter monster_id");
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Authentication.to_string(), "authentication");
        assert_eq!(ErrorKind::BodyRead.to_string(), "body-read");
        assert_eq!(ErrorKind::UnsupportedSource.to_string(), "unsupported-source");
    }
}
