//! # hrr-test
//!
//! Test utilities for handlers built on `hrr`, without a server or sockets.
//!
//! - [`TestRouter`] dispatches `http::Request`s to handlers in memory and
//!   returns the recorded response.
//! - [`assert_json_body`] matches a response body against a hand-written
//!   JSON pattern that may contain regular expressions such as `\d+`.
//! - [`test_json_post`], [`test_json_get`], [`test_json_put`] and
//!   [`test_delete`] run a whole request and check body and status.
//!
//! All helpers return `Result<_, TestError>`, so tests can use `?` or
//! `unwrap()` as they prefer.
//!
//! ## Example
//!
//! ```rust
//! use hrr::{RequestPipeline, ResponseWriter, Settings, Validate};
//! use hrr_test::{test_json_post, TestRouter};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Deserialize, Serialize)]
//! struct Monster {
//!     name: String,
//! }
//!
//! impl Validate for Monster {}
//!
//! let router = TestRouter::new().post("/v0/monsters", |req, _, resp| {
//!     let settings = Settings::default();
//!     let mut monster = Monster::default();
//!     let result = RequestPipeline::new(req, &settings)
//!         .create(&mut monster)
//!         .process();
//!
//!     let writer = ResponseWriter::new(resp, req, &settings);
//!     match result {
//!         Ok(()) => writer.write_created(|| Ok(monster)),
//!         Err(err) => writer.write_error(err),
//!     }
//! });
//!
//! let created: Monster =
//!     test_json_post(&router, "/v0/monsters", r#"{"name":"Grog"}"#, r#"{"name": "Grog"}"#)
//!         .unwrap();
//! assert_eq!(created.name, "Grog");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assert;
mod error;
mod harness;
mod router;

pub use assert::{assert_json_body, simplify_json};
pub use error::TestError;
pub use harness::{
    new_request, test_delete, test_json_get, test_json_post, test_json_put, TEST_REMOTE_ADDR,
};
pub use router::{TestRequest, TestRouter};
