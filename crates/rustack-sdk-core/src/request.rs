//! The wire-level request built from a command.
//!
//! [`Request`] is a value: every change goes through a consuming builder method
//! that returns the changed request, so a snapshot held by an observer (the
//! history sink, a test) never sees later edits.

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};

use crate::body::Body;

/// An HTTP request ready to be signed and sent.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
}

impl Request {
    /// A request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    /// Return a request with `name` set to `value`, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Return a request without the header `name`.
    #[must_use]
    pub fn without_header(mut self, name: &HeaderName) -> Self {
        self.headers.remove(name);
        self
    }

    /// Return a request whose headers are replaced wholesale.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Return a request with a different body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Return a request with a different URI.
    #[must_use]
    pub fn with_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// All headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether a header is present.
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// The `Content-Type` header, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// The payload.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Split into `http` request parts (without body) and the body.
    #[must_use]
    pub fn into_parts(self) -> (http::request::Parts, Body) {
        let (mut parts, ()) = http::Request::new(()).into_parts();
        parts.method = self.method;
        parts.uri = self.uri;
        parts.headers = self.headers;
        (parts, self.body)
    }

    /// Reassemble from `http` request parts and a body.
    #[must_use]
    pub fn from_parts(parts: http::request::Parts, body: Body) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        }
    }

    /// Convert into an `http::Request` for a transport.
    #[must_use]
    pub fn into_http(self) -> http::Request<Body> {
        let (parts, body) = self.into_parts();
        http::Request::from_parts(parts, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::new(Method::POST, Uri::from_static("https://example.com/"))
    }

    #[test]
    fn test_should_leave_snapshot_untouched_when_header_changes() {
        let original = request().with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let snapshot = original.clone();

        let changed = original.with_header(CONTENT_TYPE, HeaderValue::from_static("image/png"));

        assert_eq!(snapshot.content_type(), Some("text/plain"));
        assert_eq!(changed.content_type(), Some("image/png"));
    }

    #[test]
    fn test_should_treat_header_names_case_insensitively() {
        let req = request().with_header(
            HeaderName::from_static("x-amz-target"),
            HeaderValue::from_static("Svc.Op"),
        );
        assert_eq!(req.header("X-Amz-Target"), Some("Svc.Op"));
        assert!(req.has_header("x-amz-target"));
        assert!(!req.without_header(&HeaderName::from_static("x-amz-target")).has_header("x-amz-target"));
    }

    #[test]
    fn test_should_round_trip_through_parts() {
        let req = request()
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body("{}");
        let (parts, body) = req.into_parts();
        assert_eq!(parts.method, Method::POST);

        let rebuilt = Request::from_parts(parts, body);
        assert_eq!(rebuilt.content_type(), Some("application/json"));
        assert_eq!(rebuilt.body().as_bytes(), Some(&b"{}"[..]));
        assert_eq!(rebuilt.into_http().uri(), "https://example.com/");
    }
}
