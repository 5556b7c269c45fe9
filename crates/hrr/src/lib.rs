//! # HRR
//!
//! Declarative request pre-processing and log-correlated JSON responses for
//! HTTP handlers.
//!
//! A handler describes what it needs from a request with a
//! [`RequestPipeline`] (authentication, JSON body decoding, field validation,
//! integer path or query parameters) and runs it with one call to
//! [`process`](RequestPipeline::process). It answers through a
//! [`ResponseWriter`], which serializes the result as JSON or, on failure,
//! writes a `400` envelope carrying a correlation id that also appears in the
//! server log next to the full error cause.
//!
//! ## Components
//!
//! | Type | Role |
//! |------|------|
//! | [`RequestPipeline`] | fixed-order request stages |
//! | [`ResponseWriter`] | status selection, JSON body, error envelope |
//! | [`CorrelationId`] | links an error response to its log entry |
//! | [`SourceRegistry`] | adapters for router parameter bags |
//! | [`LoggerTemplate`] | per-request loggers, silent unless enabled |
//! | [`Settings`] | configuration injected into all of the above |
//!
//! ## Example
//!
//! ```rust
//! use hrr::{RequestPipeline, ResponseRecorder, ResponseWriter, Settings, Validate, Validator};
//! use http::{Request, StatusCode};
//! use serde::{Deserialize, Serialize};
//! use std::io::Cursor;
//!
//! #[derive(Default, Deserialize, Serialize)]
//! #[serde(default)]
//! struct Monster {
//!     name: String,
//!     cuteness: i32,
//! }
//!
//! impl Validate for Monster {
//!     fn validate(&self, v: &mut Validator<'_>) {
//!         v.field("Name", &self.name).tag("validate", "required");
//!         v.field("Cuteness", &self.cuteness).tag("validate", "required");
//!     }
//! }
//!
//! let settings = Settings::default();
//! let mut request = Request::post("/v0/monsters")
//!     .body(Cursor::new(br#"{"name":"Grog"}"#.to_vec()))
//!     .unwrap();
//!
//! let mut monster = Monster::default();
//! let result = RequestPipeline::new(&mut request, &settings)
//!     .create(&mut monster)
//!     .process();
//!
//! let mut recorder = ResponseRecorder::new();
//! let writer = ResponseWriter::new(&mut recorder, &request, &settings);
//! match result {
//!     Ok(()) => writer.write_created(|| Ok(&monster)),
//!     Err(err) => writer.write_error(err),
//! }
//!
//! assert_eq!(recorder.status(), StatusCode::BAD_REQUEST);
//! assert!(recorder.body_string().contains("Cuteness failed due to required"));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
mod correlation;
mod error;
mod logger;
mod params;
pub mod pipeline;
pub mod request;
pub mod response;
mod source;
pub mod telemetry;
pub mod testing;
mod validate;

// Re-export main types
pub use auth::{AllowAll, Authenticator};
pub use config::{HrrConfig, Settings};
pub use correlation::{CorrelationId, Entropy};
pub use error::{BoxError, ErrorKind, RequestError, RequestResult, ERROR_STATUS};
pub use logger::{LoggerTemplate, RequestLogger};
pub use params::PathParams;
pub use pipeline::{BodyTarget, RequestPipeline, Stage};
pub use request::{CapturedBody, RemoteAddr};
pub use response::{ResponseRecorder, ResponseSink, ResponseWriter};
pub use source::{MissingParameter, ParamSource, QueryParams, SourceRegistry, UnsupportedSource};
pub use validate::{
    FieldCheck, FieldError, IsZero, Validate, ValidationErrors, Validator, FRAGMENT_SEPARATOR,
};
