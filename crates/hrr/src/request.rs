//! Request-side context carried in `http::Request` extensions.

use bytes::Bytes;
use http::Request;
use std::net::SocketAddr;

/// Peer address of the connection, inserted by the server layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteAddr(pub SocketAddr);

/// Raw request body, stored by the pipeline after it has been read.
///
/// The body stream can only be consumed once, so the response writer reads
/// this extension when it has to log the body next to an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedBody(pub Bytes);

/// The parts of a request that end up in log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSummary {
    /// HTTP method.
    pub method: String,
    /// Request URI as received.
    pub url: String,
    /// Peer address, or an empty string if unknown.
    pub remote_addr: String,
    /// Captured body as lossy UTF-8; empty if it was never captured.
    pub body: String,
}

impl RequestSummary {
    /// Summarizes `request` without touching its body stream.
    #[must_use]
    pub fn of<B>(request: &Request<B>) -> Self {
        let extensions = request.extensions();
        Self {
            method: request.method().to_string(),
            url: request.uri().to_string(),
            remote_addr: extensions
                .get::<RemoteAddr>()
                .map(|addr| addr.0.to_string())
                .unwrap_or_default(),
            body: extensions
                .get::<CapturedBody>()
                .map(|body| String::from_utf8_lossy(&body.0).into_owned())
                .unwrap_or_default(),
        }
    }
}
