//! In-memory request dispatch.

use crate::TestError;
use bytes::Bytes;
use hrr::{PathParams, ResponseRecorder};
use http::{Method, Request, Response};
use std::fmt;
use std::io::Cursor;

/// Request type handed to test handlers.
pub type TestRequest = Request<Cursor<Bytes>>;

type Handler = Box<dyn Fn(&mut TestRequest, &PathParams, &mut ResponseRecorder) + Send + Sync>;

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Must equal the path segment.
    Static(String),
    /// `:name` or `{name}`; captures one path segment.
    Param(String),
    /// `*name`; captures the rest of the path.
    Wildcard(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(':') {
            Self::Param(name.to_string())
        } else if let Some(name) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
            Self::Param(name.to_string())
        } else if let Some(name) = raw.strip_prefix('*') {
            Self::Wildcard(name.to_string())
        } else {
            Self::Static(raw.to_string())
        }
    }
}

struct Route {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    handler: Handler,
}

impl Route {
    fn matches(&self, method: &Method, path: &str) -> Option<PathParams> {
        if self.method != method {
            return None;
        }

        let mut params = PathParams::new();
        let mut parts = split(path);

        for segment in &self.segments {
            match segment {
                Segment::Wildcard(name) => {
                    let rest: Vec<&str> = parts.by_ref().collect();
                    params.push(name.as_str(), rest.join("/"));
                    return Some(params);
                }
                Segment::Static(expected) => {
                    if parts.next()? != expected {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.next()?;
                    params.push(name.as_str(), value);
                }
            }
        }

        parts.next().is_none().then_some(params)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Minimal router dispatching requests to handlers in memory.
///
/// Patterns use `:name` (or `{name}`) for one captured segment and `*name`
/// for the rest of the path. Routes are tried in registration order.
///
/// # Example
///
/// ```rust
/// use hrr::{ResponseWriter, Settings};
/// use hrr_test::TestRouter;
/// use http::{Request, StatusCode};
/// use std::io::Cursor;
///
/// let router = TestRouter::new().get("/items/:id", |req, params, resp| {
///     let id = params.get("id").unwrap_or_default().to_string();
///     ResponseWriter::new(resp, req, &Settings::default())
///         .write_data(|| Ok::<_, hrr::RequestError>(id));
/// });
///
/// let request = Request::get("/items/7").body(Cursor::new(Default::default())).unwrap();
/// let response = router.dispatch(request).unwrap();
///
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.body().as_ref(), b"\"7\"");
/// ```
#[derive(Default)]
pub struct TestRouter {
    routes: Vec<Route>,
}

impl TestRouter {
    /// Creates a router without routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route for `method` and `pattern`.
    pub fn route<F>(mut self, method: Method, pattern: &str, handler: F) -> Self
    where
        F: Fn(&mut TestRequest, &PathParams, &mut ResponseRecorder) + Send + Sync + 'static,
    {
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            segments: split(pattern).map(Segment::parse).collect(),
            handler: Box::new(handler),
        });
        self
    }

    /// Adds a `GET` route.
    pub fn get<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&mut TestRequest, &PathParams, &mut ResponseRecorder) + Send + Sync + 'static,
    {
        self.route(Method::GET, pattern, handler)
    }

    /// Adds a `POST` route.
    pub fn post<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&mut TestRequest, &PathParams, &mut ResponseRecorder) + Send + Sync + 'static,
    {
        self.route(Method::POST, pattern, handler)
    }

    /// Adds a `PUT` route.
    pub fn put<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&mut TestRequest, &PathParams, &mut ResponseRecorder) + Send + Sync + 'static,
    {
        self.route(Method::PUT, pattern, handler)
    }

    /// Adds a `DELETE` route.
    pub fn delete<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&mut TestRequest, &PathParams, &mut ResponseRecorder) + Send + Sync + 'static,
    {
        self.route(Method::DELETE, pattern, handler)
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no route was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Runs the first matching handler and returns what it recorded.
    ///
    /// # Errors
    ///
    /// Returns `TestError::NoRoute` if no route matches.
    pub fn dispatch(&self, mut request: TestRequest) -> Result<Response<Bytes>, TestError> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let (route, params) = self
            .routes
            .iter()
            .find_map(|route| route.matches(&method, &path).map(|p| (route, p)))
            .ok_or(TestError::NoRoute { method, path })?;

        let mut recorder = ResponseRecorder::new();
        (route.handler)(&mut request, &params, &mut recorder);
        Ok(recorder.into_response())
    }
}

impl fmt::Debug for TestRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: Vec<String> = self
            .routes
            .iter()
            .map(|r| format!("{} {}", r.method, r.pattern))
            .collect();
        f.debug_struct("TestRouter").field("routes", &routes).finish()
    }
}
