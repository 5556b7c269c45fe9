//! Log-correlated JSON responses.
//!
//! A [`ResponseWriter`] is created per request next to the outgoing
//! [`ResponseSink`]. It remembers a status (200 unless changed) and owns a
//! fresh [`CorrelationId`]. Exactly one terminal method is called on it:
//!
//! | Method | Status | Body |
//! |--------|--------|------|
//! | [`write_data`](ResponseWriter::write_data) | configured | producer value as JSON |
//! | [`write_created`](ResponseWriter::write_created) | 201 | producer value as JSON |
//! | [`write_ok`](ResponseWriter::write_ok) | configured | empty |
//! | [`write_error`](ResponseWriter::write_error) | 400 | `{"id": "...", "message": "..."}` |
//!
//! The error path logs the error's cause together with the correlation id and
//! the request context, and sends only the client-safe message.
//!
//! # Example
//!
//! ```rust
//! use hrr::{RequestError, ResponseRecorder, ResponseWriter, Settings};
//! use http::{Request, StatusCode};
//!
//! let settings = Settings::default();
//! let request = Request::get("/v0/monsters/1").body(()).unwrap();
//! let mut recorder = ResponseRecorder::new();
//!
//! ResponseWriter::new(&mut recorder, &request, &settings)
//!     .write_data(|| Ok::<_, RequestError>(serde_json::json!({"name": "Grog"})));
//!
//! assert_eq!(recorder.status(), StatusCode::OK);
//! assert_eq!(recorder.body_string(), r#"{"name":"Grog"}"#);
//! ```

mod sink;

pub use sink::{ResponseRecorder, ResponseSink};

use crate::logger::RequestLogger;
use crate::request::RequestSummary;
use crate::telemetry::fields;
use crate::{CorrelationId, RequestError, Settings, ERROR_STATUS};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Request, StatusCode};
use serde::Serialize;

const APPLICATION_JSON: &str = "application/json";

/// Body of every error response.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'e> {
    id: &'e str,
    message: &'e str,
}

/// Single-use JSON response writer; see the [module docs](self).
#[derive(Debug)]
pub struct ResponseWriter<'a, S: ResponseSink + ?Sized> {
    sink: &'a mut S,
    request: RequestSummary,
    status: StatusCode,
    logger: RequestLogger,
    id: CorrelationId,
}

impl<'a, S: ResponseSink + ?Sized> ResponseWriter<'a, S> {
    /// Creates a writer for the response to `request`.
    ///
    /// If the request went through a pipeline, its captured body is picked
    /// up from the request extensions for error logs.
    pub fn new<B>(sink: &'a mut S, request: &Request<B>, settings: &Settings) -> Self {
        Self::with_id(sink, request, settings, CorrelationId::generate())
    }

    /// Creates a writer that uses `id` instead of a fresh identifier.
    pub fn with_id<B>(
        sink: &'a mut S,
        request: &Request<B>,
        settings: &Settings,
        id: CorrelationId,
    ) -> Self {
        let writer = Self {
            sink,
            request: RequestSummary::of(request),
            status: StatusCode::OK,
            logger: settings.logger().shared(),
            id,
        };

        if writer.id.is_degraded() {
            writer.logger.in_scope(|| {
                tracing::warn!(
                    { fields::CORRELATION_ID } = %writer.id,
                    { fields::URL } = %writer.request.url,
                    "secure random source failed, correlation id uses time-seeded fallback"
                );
            });
        }

        writer
    }

    /// Sets the status used by [`write_data`](Self::write_data) and
    /// [`write_ok`](Self::write_ok). Error responses always use 400.
    pub fn status_code(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the status that a success response will carry.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns this response's correlation identifier.
    #[must_use]
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.id
    }

    /// Logs `err` and writes the 400 error envelope.
    pub fn write_error(self, err: RequestError) {
        self.log_error(&err.log_text());

        let envelope = ErrorEnvelope {
            id: self.id.as_str(),
            message: err.message(),
        };

        match serde_json::to_vec(&envelope) {
            Ok(body) => self.send(ERROR_STATUS, Some(&body)),
            Err(e) => {
                self.log_error(&e.to_string());
                self.sink.write_header(ERROR_STATUS);
            }
        }
    }

    /// Runs `producer` and writes its value as JSON with the configured status.
    ///
    /// A producer error, or a value that cannot be serialized, is written
    /// with [`write_error`](Self::write_error) instead.
    pub fn write_data<T, F>(self, producer: F)
    where
        T: Serialize,
        F: FnOnce() -> Result<T, RequestError>,
    {
        let value = match producer() {
            Ok(value) => value,
            Err(err) => return self.write_error(err),
        };

        match serde_json::to_vec(&value) {
            Ok(body) => {
                let status = self.status;
                self.send(status, Some(&body));
            }
            Err(e) => self.write_error(RequestError::new("cannot encode response", e)),
        }
    }

    /// Writes the configured status with an empty body.
    pub fn write_ok(self) {
        let status = self.status;
        self.send(status, None);
    }

    /// Like [`write_data`](Self::write_data) with status 201.
    pub fn write_created<T, F>(self, producer: F)
    where
        T: Serialize,
        F: FnOnce() -> Result<T, RequestError>,
    {
        self.status_code(StatusCode::CREATED).write_data(producer);
    }

    fn send(self, status: StatusCode, body: Option<&[u8]>) {
        if body.is_some() {
            self.sink
                .insert_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }
        self.sink.write_header(status);

        if let Some(body) = body {
            if let Err(e) = self.sink.write(body) {
                self.log_error(&e.to_string());
            }
        }
    }

    fn log_error(&self, text: &str) {
        let request = &self.request;
        self.logger.in_scope(|| {
            tracing::error!(
                { fields::CORRELATION_ID } = %self.id,
                { fields::REMOTE_ADDR } = %request.remote_addr,
                { fields::URL } = %request.url,
                { fields::METHOD } = %request.method,
                { fields::BODY } = %request.body,
                "{text}"
            );
        });
    }
}
