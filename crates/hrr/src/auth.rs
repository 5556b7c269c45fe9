//! Caller authentication.
//!
//! The pipeline does not decide who may call an endpoint. It extracts the
//! HTTP Basic credentials and hands them to an [`Authenticator`] supplied by
//! the service. Any closure `Fn(&str, &str) -> Result<bool, BoxError>` is an
//! authenticator.

use crate::BoxError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::HeaderMap;

const BASIC_PREFIX: &str = "Basic ";

/// Decides whether a username/password pair may proceed.
pub trait Authenticator: Send + Sync {
    /// Returns `Ok(true)` to accept the caller.
    ///
    /// `Ok(false)` rejects the caller. An `Err` also rejects, and its text
    /// is logged as the cause.
    fn authenticate(&self, user: &str, password: &str) -> Result<bool, BoxError>;
}

impl<F> Authenticator for F
where
    F: Fn(&str, &str) -> Result<bool, BoxError> + Send + Sync,
{
    fn authenticate(&self, user: &str, password: &str) -> Result<bool, BoxError> {
        self(user, password)
    }
}

/// Authenticator accepting every caller; the pipeline default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn authenticate(&self, _user: &str, _password: &str) -> Result<bool, BoxError> {
        Ok(true)
    }
}

/// Username and password from an `Authorization: Basic` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicCredentials {
    /// Username; empty when the header is absent or malformed.
    pub user: String,
    /// Password; empty when the header is absent or malformed.
    pub password: String,
}

impl BasicCredentials {
    /// Extracts the credentials from `headers`.
    ///
    /// A missing or malformed header yields empty strings rather than an
    /// error, so the authenticator alone decides what anonymous callers get.
    ///
    /// ```rust
    /// use hrr::auth::BasicCredentials;
    /// use http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic YWxpY2U6czNjcjN0"));
    ///
    /// let creds = BasicCredentials::from_headers(&headers);
    /// assert_eq!(creds.user, "alice");
    /// assert_eq!(creds.password, "s3cr3t");
    /// ```
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::parse(headers).unwrap_or_default()
    }

    fn parse(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let prefix = value.get(..BASIC_PREFIX.len())?;
        if !prefix.eq_ignore_ascii_case(BASIC_PREFIX) {
            return None;
        }

        let decoded = STANDARD.decode(&value[BASIC_PREFIX.len()..]).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':')?;

        Some(Self {
            user: user.to_string(),
            password: password.to_string(),
        })
    }
}
