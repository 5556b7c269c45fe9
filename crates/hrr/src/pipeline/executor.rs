//! Fixed-order execution of a configured pipeline.

use super::{RequestPipeline, Stage};
use crate::auth::BasicCredentials;
use crate::request::{CapturedBody, RemoteAddr};
use crate::source::MissingParameter;
use crate::telemetry::fields;
use crate::RequestError;
use bytes::Bytes;
use std::io::Read;

pub(super) fn run<B: Read>(pipeline: &mut RequestPipeline<'_, B>) -> Result<(), RequestError> {
    for stage in pipeline.plan() {
        if let Err(err) = run_stage(pipeline, stage) {
            pipeline.logger.in_scope(|| {
                tracing::debug!(stage = %stage, kind = %err.kind(), "request pipeline stopped");
            });
            return Err(err);
        }
    }
    Ok(())
}

fn run_stage<B: Read>(
    pipeline: &mut RequestPipeline<'_, B>,
    stage: Stage,
) -> Result<(), RequestError> {
    match stage {
        Stage::Authenticate => authenticate(pipeline),
        Stage::CaptureBody => capture_body(pipeline),
        Stage::LogRequest => {
            log_request(pipeline);
            Ok(())
        }
        Stage::Decode => decode(pipeline),
        Stage::Validate => validate(pipeline),
        Stage::ExtractParams => extract_params(pipeline),
    }
}

fn authenticate<B>(pipeline: &RequestPipeline<'_, B>) -> Result<(), RequestError> {
    let creds = BasicCredentials::from_headers(pipeline.request.headers());

    match pipeline.authenticator.authenticate(&creds.user, &creds.password) {
        Ok(true) => Ok(()),
        Ok(false) => Err(RequestError::authentication(&creds.user, None)),
        Err(cause) => Err(RequestError::authentication(&creds.user, Some(cause))),
    }
}

fn capture_body<B: Read>(pipeline: &mut RequestPipeline<'_, B>) -> Result<(), RequestError> {
    let mut buf = Vec::new();
    pipeline
        .request
        .body_mut()
        .read_to_end(&mut buf)
        .map_err(RequestError::body_read)?;

    let body = Bytes::from(buf);
    pipeline
        .request
        .extensions_mut()
        .insert(CapturedBody(body.clone()));
    pipeline.body = body;
    Ok(())
}

fn log_request<B>(pipeline: &RequestPipeline<'_, B>) {
    let request = &*pipeline.request;
    let remote_addr = request
        .extensions()
        .get::<RemoteAddr>()
        .map(|addr| addr.0.to_string())
        .unwrap_or_default();
    let body = String::from_utf8_lossy(&pipeline.body);

    pipeline.logger.in_scope(|| {
        tracing::info!(
            { fields::REMOTE_ADDR } = %remote_addr,
            { fields::METHOD } = %request.method(),
            { fields::URL } = %request.uri(),
            { fields::BODY } = %body,
            "request received"
        );
    });
}

fn decode<B>(pipeline: &mut RequestPipeline<'_, B>) -> Result<(), RequestError> {
    let Some(target) = pipeline.target.as_deref_mut() else {
        return Ok(());
    };
    target
        .decode_json(&pipeline.body)
        .map_err(RequestError::decode)
}

fn validate<B>(pipeline: &RequestPipeline<'_, B>) -> Result<(), RequestError> {
    let Some(target) = pipeline.target.as_deref() else {
        return Ok(());
    };
    target
        .check(pipeline.settings.validation_tag())
        .map_err(RequestError::validation)
}

fn extract_params<B>(pipeline: &mut RequestPipeline<'_, B>) -> Result<(), RequestError> {
    let registry = pipeline.settings.sources();

    for param in &mut pipeline.params {
        let raw = registry
            .resolve(param.source, param.type_name, &param.name)
            .map_err(RequestError::unsupported_source)?
            .ok_or_else(|| {
                RequestError::param(
                    &param.name,
                    MissingParameter {
                        name: param.name.clone(),
                    },
                )
            })?;

        *param.dest = raw
            .parse::<i64>()
            .map_err(|e| RequestError::param(&param.name, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CapturedLogs;
    use crate::{ErrorKind, LoggerTemplate, PathParams, Settings, Validate, Validator};
    use serde::Deserialize;
    use std::io::{self, Cursor};

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Monster {
        #[serde(default)]
        name: String,
        #[serde(default)]
        cuteness: i64,
    }

    impl Validate for Monster {
        fn validate(&self, v: &mut Validator<'_>) {
            v.field("Name", &self.name).tag("validate", "required");
            v.field("Cuteness", &self.cuteness).tag("validate", "required");
        }
    }

    struct FailingBody;

    impl Read for FailingBody {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer hung up"))
        }
    }

    fn request(body: &str) -> http::Request<Cursor<Vec<u8>>> {
        http::Request::post("/v0/monsters")
            .body(Cursor::new(body.as_bytes().to_vec()))
            .unwrap()
    }

    #[test]
    fn test_body_is_captured_in_extensions() {
        let settings = Settings::default();
        let mut req = request("{\"name\":\"Grog\"}");

        RequestPipeline::new(&mut req, &settings).process().unwrap();

        let captured = req.extensions().get::<CapturedBody>().unwrap();
        assert_eq!(captured.0.as_ref(), b"{\"name\":\"Grog\"}");
    }

    #[test]
    fn test_body_read_failure() {
        let settings = Settings::default();
        let mut req = http::Request::post("/").body(FailingBody).unwrap();

        let err = RequestPipeline::new(&mut req, &settings)
            .process()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BodyRead);
        assert_eq!(err.message(), "cannot read request body");
        assert!(err.log_text().contains("peer hung up"));
    }

    #[test]
    fn test_authenticator_error_is_cause() {
        let settings = Settings::default();
        let mut req = request("");

        let err = RequestPipeline::new(&mut req, &settings)
            .authenticate_with(|_: &str, _: &str| -> Result<bool, crate::BoxError> {
                Err("directory unavailable".into())
            })
            .process()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "Unauthorized user ");
        assert_eq!(err.log_text(), "directory unavailable");
    }

    #[test]
    fn test_shared_authenticator_across_requests() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let settings = Settings::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let shared: Arc<dyn crate::Authenticator> =
            Arc::new(move |user: &str, _: &str| -> Result<bool, crate::BoxError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(user.is_empty())
            });

        for _ in 0..2 {
            let mut req = request("");
            RequestPipeline::new(&mut req, &settings)
                .authenticate_with_shared(Arc::clone(&shared))
                .process()
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_param_names_it() {
        let settings = Settings::default();
        let mut req = request("");
        let params = PathParams::new();
        let mut id = 0;

        let err = RequestPipeline::new(&mut req, &settings)
            .extract_i64_param(&params, "monster_id", &mut id)
            .process()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Param);
        assert_eq!(err.message(), "cannot find int64 parameter monster_id");
        assert!(err.log_text().contains("monster_id"));
    }

    #[test]
    fn test_first_param_failure_stops() {
        let settings = Settings::default();
        let mut req = request("");
        let params: PathParams = [("a", "x"), ("b", "2")].into_iter().collect();
        let mut a = -1;
        let mut b = -1;

        let err = RequestPipeline::new(&mut req, &settings)
            .extract_i64_param(&params, "a", &mut a)
            .extract_i64_param(&params, "b", &mut b)
            .process()
            .unwrap_err();

        assert_eq!(err.message(), "cannot find int64 parameter a");
        assert_eq!(a, -1);
        assert_eq!(b, -1);
    }

    #[test]
    fn test_unsupported_source() {
        let settings = Settings::default();
        let mut req = request("");
        let source = 7_u8;
        let mut id = 0;

        let err = RequestPipeline::new(&mut req, &settings)
            .extract_i64_param(&source, "id", &mut id)
            .process()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedSource);
        assert!(err.log_text().contains("u8"));
    }

    #[test]
    fn test_request_log_event() {
        let logs = CapturedLogs::new();
        let settings = Settings::builder()
            .logger(LoggerTemplate::new(logs.dispatch()))
            .build();
        let mut req = request("{\"name\":\"Grog\"}");
        req.extensions_mut()
            .insert(RemoteAddr("192.0.2.1:4000".parse().unwrap()));

        RequestPipeline::new(&mut req, &settings)
            .enable_logging()
            .process()
            .unwrap();

        let event = logs.last_event().unwrap();
        assert_eq!(event["level"], "INFO");
        assert_eq!(event["fields"][fields::REMOTE_ADDR], "192.0.2.1:4000");
        assert_eq!(event["fields"]["method"], "POST");
        assert_eq!(event["fields"]["url"], "/v0/monsters");
        assert_eq!(event["fields"]["body"], "{\"name\":\"Grog\"}");
    }

    #[test]
    fn test_request_is_logged_before_decode_fails() {
        let logs = CapturedLogs::new();
        let settings = Settings::builder()
            .logger(LoggerTemplate::new(logs.dispatch()))
            .build();
        let mut req = request("not json");
        let mut monster = Monster::default();

        let err = RequestPipeline::new(&mut req, &settings)
            .enable_logging()
            .decode_body_into(&mut monster)
            .process()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decode);
        let events = logs.events();
        assert!(events
            .iter()
            .any(|e| e["fields"]["message"] == "request received" && e["fields"]["body"] == "not json"));
    }

    #[test]
    fn test_logging_disabled_by_default() {
        let logs = CapturedLogs::new();
        let settings = Settings::builder()
            .logger(LoggerTemplate::new(logs.dispatch()))
            .build();
        let mut req = request("{}");

        RequestPipeline::new(&mut req, &settings).process().unwrap();

        assert!(logs.events().is_empty());
    }

    #[test]
    fn test_validation_uses_configured_tag() {
        #[derive(Deserialize)]
        struct Tagged {
            name: String,
        }

        impl Validate for Tagged {
            fn validate(&self, v: &mut Validator<'_>) {
                v.field("Name", &self.name).tag("binding", "required");
            }
        }

        let settings = Settings::new(crate::HrrConfig {
            validation_tag: "binding".to_string(),
            ..crate::HrrConfig::default()
        });
        let mut req = request("{\"name\":\"\"}");
        let mut target = Tagged {
            name: "x".to_string(),
        };

        let err = RequestPipeline::new(&mut req, &settings)
            .create(&mut target)
            .process()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "Name failed due to required");
    }
}
