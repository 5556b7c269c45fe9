//! One-call checks for JSON handlers.
//!
//! Each helper sends a request with `Content-Type: application/json` through
//! a [`TestRouter`], checks the body against a pattern (see
//! [`assert_json_body`]) and then the status. The body is checked first so a
//! failing handler reports its error envelope rather than just a 400.

use crate::{assert_json_body, TestError, TestRequest, TestRouter};
use bytes::Bytes;
use hrr::RemoteAddr;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::io::Cursor;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Peer address attached to every request built here (TEST-NET-1).
pub const TEST_REMOTE_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 1234);

/// Builds a JSON request with [`TEST_REMOTE_ADDR`] as its peer address.
pub fn new_request(
    method: Method,
    url: &str,
    body: impl Into<Bytes>,
) -> Result<TestRequest, TestError> {
    let mut request = Request::builder()
        .method(method)
        .uri(url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(Cursor::new(body.into()))?;
    request.extensions_mut().insert(RemoteAddr(TEST_REMOTE_ADDR));
    Ok(request)
}

/// POSTs `body` to `url`, expects 201 and a body matching `expected`, and
/// decodes the response.
pub fn test_json_post<T: DeserializeOwned>(
    router: &TestRouter,
    url: &str,
    body: &str,
    expected: &str,
) -> Result<T, TestError> {
    let response = send(router, Method::POST, url, body.to_owned(), Some(expected))?;
    expect_status(&response, StatusCode::CREATED)?;
    Ok(serde_json::from_slice(response.body())?)
}

/// GETs `url` and expects 200 and a body matching `expected`.
pub fn test_json_get(router: &TestRouter, url: &str, expected: &str) -> Result<(), TestError> {
    let response = send(router, Method::GET, url, Bytes::new(), Some(expected))?;
    expect_status(&response, StatusCode::OK)
}

/// PUTs `body` to `url`, expects 200 and a body matching `expected`, and
/// decodes the response.
pub fn test_json_put<T: DeserializeOwned>(
    router: &TestRouter,
    url: &str,
    body: &str,
    expected: &str,
) -> Result<T, TestError> {
    let response = send(router, Method::PUT, url, body.to_owned(), Some(expected))?;
    expect_status(&response, StatusCode::OK)?;
    Ok(serde_json::from_slice(response.body())?)
}

/// DELETEs `url` and expects 200. The body is not checked.
pub fn test_delete(router: &TestRouter, url: &str) -> Result<(), TestError> {
    let response = send(router, Method::DELETE, url, Bytes::new(), None)?;
    expect_status(&response, StatusCode::OK)
}

fn send(
    router: &TestRouter,
    method: Method,
    url: &str,
    body: impl Into<Bytes>,
    expected: Option<&str>,
) -> Result<Response<Bytes>, TestError> {
    let response = router.dispatch(new_request(method, url, body)?)?;
    if let Some(expected) = expected {
        assert_json_body(expected, response.body())?;
    }
    Ok(response)
}

fn expect_status(response: &Response<Bytes>, expected: StatusCode) -> Result<(), TestError> {
    match response.status() {
        actual if actual == expected => Ok(()),
        actual => Err(TestError::StatusMismatch { expected, actual }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrr::{PathParams, ResponseRecorder, ResponseSink};

    fn fixed(status: StatusCode, body: &'static str) -> TestRouter {
        let handler = move |_: &mut TestRequest, _: &PathParams, resp: &mut ResponseRecorder| {
            resp.write_header(status);
            resp.write(body.as_bytes()).unwrap();
        };
        TestRouter::new()
            .route(Method::GET, "/thing", handler)
            .route(Method::POST, "/thing", handler)
            .route(Method::PUT, "/thing", handler)
            .route(Method::DELETE, "/thing", handler)
    }

    #[test]
    fn test_new_request_sets_context() {
        let request = new_request(Method::POST, "/thing?x=1", "{}").unwrap();

        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            request.extensions().get::<RemoteAddr>(),
            Some(&RemoteAddr(TEST_REMOTE_ADDR))
        );
        assert_eq!(request.body().get_ref().as_ref(), b"{}");
    }

    #[test]
    fn test_new_request_bad_url() {
        let err = new_request(Method::GET, "/a b", Bytes::new()).unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }

    #[test]
    fn test_post_expects_created() {
        let router = fixed(StatusCode::CREATED, r#"{"n":1}"#);
        let value: serde_json::Value =
            test_json_post(&router, "/thing", "{}", r#"{"n":\d}"#).unwrap();
        assert_eq!(value["n"], 1);

        let router = fixed(StatusCode::OK, r#"{"n":1}"#);
        let err = test_json_post::<serde_json::Value>(&router, "/thing", "{}", r#"{"n":1}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            TestError::StatusMismatch {
                expected: StatusCode::CREATED,
                ..
            }
        ));
    }

    #[test]
    fn test_body_checked_before_status() {
        let router = fixed(StatusCode::BAD_REQUEST, r#"{"message":"nope"}"#);

        let err = test_json_get(&router, "/thing", r#"{"n":1}"#).unwrap_err();
        assert!(matches!(err, TestError::BodyMismatch { .. }));
    }

    #[test]
    fn test_put_decodes_body() {
        let router = fixed(StatusCode::OK, r#"{"n":2}"#);
        let value: serde_json::Value =
            test_json_put(&router, "/thing", "{}", r#"{"n":2}"#).unwrap();
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn test_put_undecodable_body() {
        let router = fixed(StatusCode::OK, "[1, 2]");
        let err = test_json_put::<String>(&router, "/thing", "{}", r"\[1").unwrap_err();
        assert!(matches!(err, TestError::Json(_)));
    }

    #[test]
    fn test_delete_ignores_body() {
        assert!(test_delete(&fixed(StatusCode::OK, "whatever"), "/thing").is_ok());
        assert!(test_delete(&fixed(StatusCode::NOT_FOUND, ""), "/thing").is_err());
    }

    #[test]
    fn test_unknown_route() {
        let err = test_delete(&TestRouter::new(), "/thing").unwrap_err();
        assert!(matches!(err, TestError::NoRoute { .. }));
    }
}
