//! Error types for credential resolution and request signing.

/// Errors raised while resolving credentials or signing a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credentials could be found by the provider.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The credentials carry an expiration that has already passed.
    #[error("Credentials for access key {0} have expired")]
    ExpiredCredentials(String),

    /// The request URI has no authority to derive the `host` header from.
    #[error("Request URI has no host: {0}")]
    MissingHost(String),

    /// A computed header value contains characters not allowed in HTTP headers.
    #[error("Invalid header value for {0}")]
    InvalidHeaderValue(String),

    /// The payload cannot be hashed without reading it (e.g. a file stream).
    ///
    /// Streaming bodies must be signed with an unsigned-payload signer.
    #[error("Payload must be hashed but is a stream; use an unsigned-payload signer")]
    UnhashablePayload,
}
