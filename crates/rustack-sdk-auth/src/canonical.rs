//! Canonical request construction for AWS Signature Version 4.
//!
//! The canonical request is the normalized form of an outgoing request that
//! both the client and the service hash before computing a signature:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! [`CanonicalRequest::from_parts`] picks the headers to sign from the request
//! itself, skipping the ones proxies and SDK bookkeeping are allowed to rewrite.

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::{Digest, Sha256};

/// Characters left unencoded in canonical URI path segments.
///
/// Everything except the RFC 3986 unreserved set (`A-Z a-z 0-9 - _ . ~`) is
/// encoded. Forward slashes are handled by splitting on segments.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Headers that are never included in the signature.
///
/// These are either added or rewritten after signing (`user-agent`, tracing
/// headers, the SDK invocation headers) or are the signature itself.
const UNSIGNABLE_HEADERS: &[&str] = &[
    "authorization",
    "user-agent",
    "expect",
    "x-amzn-trace-id",
    "amz-sdk-invocation-id",
    "amz-sdk-request",
];

/// A normalized request ready to be hashed into the string to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    uri: String,
    query: String,
    /// Lowercase header name to trimmed, comma-joined value. Sorted by name.
    headers: BTreeMap<String, String>,
    payload_hash: String,
}

impl CanonicalRequest {
    /// Build the canonical form of the given request parts.
    ///
    /// Every header present in `parts` is signed unless it is in the
    /// unsignable list. Repeated headers are joined with commas in the order
    /// they appear.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts, payload_hash: &str) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &parts.headers {
            let name = name.as_str();
            if UNSIGNABLE_HEADERS.contains(&name) {
                continue;
            }
            let Ok(value) = value.to_str() else {
                continue;
            };
            let value = collapse_whitespace(value.trim());
            headers
                .entry(name.to_owned())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        Self {
            method: parts.method.as_str().to_owned(),
            uri: build_canonical_uri(parts.uri.path()),
            query: build_canonical_query_string(parts.uri.query().unwrap_or("")),
            headers,
            payload_hash: payload_hash.to_owned(),
        }
    }

    /// The `SignedHeaders` component: sorted, semicolon-separated header names.
    #[must_use]
    pub fn signed_headers(&self) -> String {
        self.headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Hex-encoded SHA-256 of the canonical request string.
    #[must_use]
    pub fn hash(&self) -> String {
        hex::encode(Sha256::digest(self.to_string().as_bytes()))
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let canonical_headers = self
            .headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}"))
            .collect::<Vec<_>>()
            .join("\n");

        write!(
            f,
            "{}\n{}\n{}\n{}\n\n{}\n{}",
            self.method,
            self.uri,
            self.query,
            canonical_headers,
            self.signed_headers(),
            self.payload_hash
        )
    }
}

/// Build the canonical URI by URI-encoding each path segment individually.
///
/// Forward slashes are preserved and an empty path becomes `/`. Segments are
/// decoded before encoding so an already-encoded path is not encoded twice.
///
/// # Examples
///
/// ```
/// use rustack_sdk_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/test.txt"), "/test.txt");
/// assert_eq!(build_canonical_uri(""), "/");
/// assert_eq!(build_canonical_uri("/my key"), "/my%20key");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            utf8_percent_encode(&decoded, URI_ENCODE_SET).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the canonical query string by sorting parameters by key, then value.
///
/// Values are kept exactly as they appear on the wire: the serializer that
/// produced the URI already chose the encoding, and the service hashes the
/// same bytes.
///
/// # Examples
///
/// ```
/// use rustack_sdk_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string(""), "");
/// assert_eq!(build_canonical_query_string("b=2&a=1&list"), "a=1&b=2&list=");
/// ```
#[must_use]
pub fn build_canonical_query_string(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .collect();
    params.sort_unstable();

    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Collapse runs of whitespace into a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
