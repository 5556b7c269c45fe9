//! Declarative request pre-processing.
//!
//! A [`RequestPipeline`] is configured per request with builder calls and
//! then run once with [`process`](RequestPipeline::process). The builder
//! only records what should happen; every step runs inside `process`, in
//! the fixed order of [`Stage::ORDER`] no matter in which order the builder
//! methods were called:
//!
//! 1. **Authenticate** - HTTP Basic credentials are passed to the authenticator
//! 2. **Capture body** - the body is read once and kept for logging
//! 3. **Log request** - only when logging is enabled for this request
//! 4. **Decode** - JSON into the decode target, if one was given
//! 5. **Validate** - field constraints of the target, if requested
//! 6. **Extract params** - integer parameters, in registration order
//!
//! The first failing stage stops the pipeline and its [`RequestError`] is
//! returned.
//!
//! # Example
//!
//! ```rust
//! use hrr::{PathParams, RequestPipeline, Settings, Validate, Validator};
//! use http::Request;
//! use serde::Deserialize;
//! use std::io::Cursor;
//!
//! #[derive(Default, Deserialize)]
//! struct Monster {
//!     name: String,
//! }
//!
//! impl Validate for Monster {
//!     fn validate(&self, v: &mut Validator<'_>) {
//!         v.field("Name", &self.name).tag("validate", "required");
//!     }
//! }
//!
//! let settings = Settings::default();
//! let mut request = Request::put("/v0/monsters/7")
//!     .body(Cursor::new(br#"{"name":"Grog"}"#.to_vec()))
//!     .unwrap();
//! let params: PathParams = [("id", "7")].into_iter().collect();
//!
//! let mut monster = Monster::default();
//! let mut id = 0_i64;
//!
//! RequestPipeline::new(&mut request, &settings)
//!     .update(&mut monster, &params, "id", &mut id)
//!     .process()
//!     .unwrap();
//!
//! assert_eq!(monster.name, "Grog");
//! assert_eq!(id, 7);
//! ```

mod executor;
mod stage;

pub use stage::Stage;

use crate::auth::{AllowAll, Authenticator};
use crate::logger::RequestLogger;
use crate::validate::{ValidationErrors, Validator};
use crate::{RequestError, Settings, Validate};
use bytes::Bytes;
use http::Request;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Destination of the decoded request body.
///
/// Implemented for every `T: DeserializeOwned + Validate`. A type that is
/// only decoded implements [`Validate`] with an empty body, and
/// `serde_json::Value` works without any extra impl.
pub trait BodyTarget {
    /// Replaces `self` with the value decoded from `body`.
    ///
    /// On error `self` is left untouched.
    fn decode_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error>;

    /// Runs the declared field constraints under `tag_name`.
    fn check(&self, tag_name: &str) -> Result<(), ValidationErrors>;
}

impl<T: DeserializeOwned + Validate> BodyTarget for T {
    fn decode_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error> {
        *self = serde_json::from_slice(body)?;
        Ok(())
    }

    fn check(&self, tag_name: &str) -> Result<(), ValidationErrors> {
        Validator::run(self, tag_name)
    }
}

/// One registered integer parameter.
struct ParamRequest<'a> {
    source: &'a dyn Any,
    type_name: &'static str,
    name: String,
    dest: &'a mut i64,
}

/// Per-request pre-processing configuration; see the [module docs](self).
pub struct RequestPipeline<'a, B> {
    request: &'a mut Request<B>,
    settings: &'a Settings,
    logger: RequestLogger,
    target: Option<&'a mut dyn BodyTarget>,
    validate: bool,
    authenticator: Arc<dyn Authenticator>,
    params: Vec<ParamRequest<'a>>,
    body: Bytes,
}

impl<'a, B> RequestPipeline<'a, B> {
    /// Creates a pipeline for `request`.
    ///
    /// Logging starts enabled if `settings` log all requests.
    pub fn new(request: &'a mut Request<B>, settings: &'a Settings) -> Self {
        Self {
            request,
            settings,
            logger: settings.logger().fork(settings.log_all_requests()),
            target: None,
            validate: false,
            authenticator: Arc::new(AllowAll),
            params: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Logs this request even if logging is not globally enabled.
    pub fn enable_logging(mut self) -> Self {
        self.logger.enable();
        self
    }

    /// Decodes the JSON body into `target`.
    ///
    /// Constraints declared by the target's [`Validate`] impl only run when
    /// [`validate_body`](Self::validate_body) is also called.
    pub fn decode_body_into<T: BodyTarget>(mut self, target: &'a mut T) -> Self {
        self.target = Some(target);
        self
    }

    /// Checks the decoded body against its field constraints.
    ///
    /// Has no effect without a decode target.
    pub fn validate_body(mut self) -> Self {
        self.validate = true;
        self
    }

    /// Replaces the default accept-everyone authenticator.
    pub fn authenticate_with(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Arc::new(authenticator);
        self
    }

    /// Shares an authenticator that is already reference counted.
    pub fn authenticate_with_shared(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Parses the parameter `name` from `source` as a base-10 `i64` into `dest`.
    ///
    /// `source` may be any type known to the settings'
    /// [`SourceRegistry`](crate::SourceRegistry).
    pub fn extract_i64_param<S: Any>(
        mut self,
        source: &'a S,
        name: impl Into<String>,
        dest: &'a mut i64,
    ) -> Self {
        self.params.push(ParamRequest {
            source,
            type_name: std::any::type_name::<S>(),
            name: name.into(),
            dest,
        });
        self
    }

    /// Decode and validate; the usual configuration for creating a resource.
    pub fn create<T: BodyTarget>(self, target: &'a mut T) -> Self {
        self.decode_body_into(target).validate_body()
    }

    /// Decode, validate, and extract one parameter; the usual configuration
    /// for updating a resource.
    pub fn update<T: BodyTarget, S: Any>(
        self,
        target: &'a mut T,
        source: &'a S,
        name: impl Into<String>,
        dest: &'a mut i64,
    ) -> Self {
        self.create(target).extract_i64_param(source, name, dest)
    }

    /// Returns true if the request will be logged.
    #[must_use]
    pub fn logging_enabled(&self) -> bool {
        self.logger.is_enabled()
    }

    /// Returns the stages [`process`](Self::process) will run, in order.
    #[must_use]
    pub fn plan(&self) -> Vec<Stage> {
        Stage::ORDER
            .into_iter()
            .filter(|stage| match stage {
                Stage::Authenticate | Stage::CaptureBody => true,
                Stage::LogRequest => self.logging_enabled(),
                Stage::Decode => self.target.is_some(),
                Stage::Validate => self.validate && self.target.is_some(),
                Stage::ExtractParams => !self.params.is_empty(),
            })
            .collect()
    }
}

impl<B: Read> RequestPipeline<'_, B> {
    /// Runs every configured stage.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage:
    ///
    /// - `Authentication` if the authenticator rejects the caller or fails
    /// - `BodyRead` if the body cannot be read
    /// - `Decode` if the body is not valid JSON for the target
    /// - `Validation` with one fragment per failing field
    /// - `UnsupportedSource` if a parameter source type is not registered
    /// - `Param` if a parameter is missing or not an integer
    ///
    /// The pipeline is consumed since the body can only be read once. The
    /// captured body stays available as a [`CapturedBody`](crate::CapturedBody)
    /// request extension.
    ///
    /// ```compile_fail
    /// use hrr::{RequestPipeline, Settings};
    /// use std::io::Cursor;
    ///
    /// let settings = Settings::default();
    /// let mut request = http::Request::get("/").body(Cursor::new(Vec::new())).unwrap();
    ///
    /// let pipeline = RequestPipeline::new(&mut request, &settings);
    /// pipeline.process().unwrap();
    /// pipeline.process().unwrap();
    /// ```
    pub fn process(mut self) -> Result<(), RequestError> {
        executor::run(&mut self)
    }
}

impl<B> fmt::Debug for RequestPipeline<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("stages", &self.plan())
            .field("params", &self.params.iter().map(|p| &p.name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathParams;
    use serde::Deserialize;
    use std::io::Cursor;

    #[derive(Debug, Default, Deserialize)]
    struct Monster {
        name: String,
    }

    impl Validate for Monster {}

    fn request() -> Request<Cursor<Vec<u8>>> {
        Request::post("/").body(Cursor::new(Vec::new())).unwrap()
    }

    #[test]
    fn test_default_plan() {
        let settings = Settings::default();
        let mut req = request();
        let pipeline = RequestPipeline::new(&mut req, &settings);

        assert_eq!(pipeline.plan(), [Stage::Authenticate, Stage::CaptureBody]);
        assert!(!pipeline.logging_enabled());
    }

    #[test]
    fn test_plan_ignores_builder_order() {
        let settings = Settings::default();
        let mut req = request();
        let params = PathParams::new();
        let mut monster = Monster::default();
        let mut id = 0;

        let pipeline = RequestPipeline::new(&mut req, &settings)
            .extract_i64_param(&params, "id", &mut id)
            .validate_body()
            .enable_logging()
            .decode_body_into(&mut monster);

        assert_eq!(pipeline.plan(), Stage::ORDER);
    }

    #[test]
    fn test_validate_without_target_is_skipped() {
        let settings = Settings::default();
        let mut req = request();
        let pipeline = RequestPipeline::new(&mut req, &settings).validate_body();

        assert!(!pipeline.plan().contains(&Stage::Validate));
    }

    #[test]
    fn test_global_logging_flag() {
        let settings = Settings::new(crate::HrrConfig {
            log_all_requests: true,
            ..crate::HrrConfig::default()
        });
        let mut req = request();
        let pipeline = RequestPipeline::new(&mut req, &settings);

        assert!(pipeline.logging_enabled());
        assert!(pipeline.plan().contains(&Stage::LogRequest));
    }

    #[test]
    fn test_create_shortcut() {
        let settings = Settings::default();
        let mut req = request();
        let mut monster = Monster::default();
        let pipeline = RequestPipeline::new(&mut req, &settings).create(&mut monster);

        assert_eq!(
            pipeline.plan(),
            [
                Stage::Authenticate,
                Stage::CaptureBody,
                Stage::Decode,
                Stage::Validate
            ]
        );
    }

    #[test]
    fn test_decode_untyped_json() {
        let settings = Settings::default();
        let mut req = Request::post("/")
            .body(Cursor::new(br#"{"name":""}"#.to_vec()))
            .unwrap();
        let mut value = serde_json::Value::Null;

        RequestPipeline::new(&mut req, &settings)
            .decode_body_into(&mut value)
            .validate_body()
            .process()
            .unwrap();

        assert_eq!(value["name"], "");
    }

    #[test]
    fn test_body_target_keeps_value_on_error() {
        let mut monster = Monster {
            name: "Grog".to_string(),
        };

        assert!(monster.decode_json(b"{\"name\":").is_err());
        assert_eq!(monster.name, "Grog");

        monster.decode_json(br#"{"name":"Bob"}"#).unwrap();
        assert_eq!(monster.name, "Bob");
    }
}
