//! Outgoing response channels.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Response, StatusCode};
use std::io;

/// Where a [`ResponseWriter`](super::ResponseWriter) puts status, headers and body.
///
/// Headers must be inserted before the status is written; servers usually
/// flush both together.
pub trait ResponseSink {
    /// Sets the response status.
    fn write_header(&mut self, status: StatusCode);

    /// Sets a response header, replacing any previous value.
    fn insert_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Appends `body` to the response body.
    fn write(&mut self, body: &[u8]) -> io::Result<()>;
}

impl ResponseSink for Response<Vec<u8>> {
    fn write_header(&mut self, status: StatusCode) {
        *self.status_mut() = status;
    }

    fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers_mut().insert(name, value);
    }

    fn write(&mut self, body: &[u8]) -> io::Result<()> {
        self.body_mut().extend_from_slice(body);
        Ok(())
    }
}

/// In-memory sink for tests and adapters.
///
/// Like a real connection, only the first status written counts. A
/// recorder that never got a status reports `200 OK`.
///
/// # Example
///
/// ```rust
/// use hrr::{ResponseRecorder, ResponseSink};
/// use http::StatusCode;
///
/// let mut recorder = ResponseRecorder::new();
/// recorder.write_header(StatusCode::CREATED);
/// recorder.write(b"{}").unwrap();
///
/// let response = recorder.into_response();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(response.body().as_ref(), b"{}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns the recorded headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the recorded body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the recorded body as lossy UTF-8.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Converts the recording into an `http::Response`.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let status = self.status();
        let mut response = Response::new(Bytes::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for ResponseRecorder {
    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn write(&mut self, body: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_recorder_defaults_to_ok() {
        let recorder = ResponseRecorder::new();

        assert_eq!(recorder.status(), StatusCode::OK);
        assert!(recorder.body().is_empty());
    }

    #[test]
    fn test_recorder_keeps_first_status() {
        let mut recorder = ResponseRecorder::new();
        recorder.write_header(StatusCode::BAD_REQUEST);
        recorder.write_header(StatusCode::OK);

        assert_eq!(recorder.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_recorder_into_response() {
        let mut recorder = ResponseRecorder::new();
        recorder.insert_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        recorder.write(b"[1,").unwrap();
        recorder.write(b"2]").unwrap();

        assert_eq!(recorder.body_string(), "[1,2]");

        let response = recorder.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body().as_ref(), b"[1,2]");
    }

    #[test]
    fn test_into_response_carries_recorded_status() {
        let mut recorder = ResponseRecorder::new();
        recorder.write_header(StatusCode::CREATED);
        recorder.write(b"{}").unwrap();

        let response = recorder.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body().as_ref(), b"{}");
    }

    #[test]
    fn test_http_response_sink() {
        let mut response = Response::new(Vec::new());
        response.write_header(StatusCode::CREATED);
        response.write(b"{}").unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body(), b"{}");
    }
}
