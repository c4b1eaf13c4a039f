//! Request signers.
//!
//! [`SignatureV4`] signs with AWS Signature Version 4 via
//! [`rustack_sdk_auth::sign_parts`]. The standard variant hashes the payload
//! and therefore needs it in memory; the unsigned-payload variant signs
//! `UNSIGNED-PAYLOAD` instead and is the one to use for file-backed bodies.
//! [`AnonymousSigner`] leaves requests untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use rustack_sdk_auth::{AuthError, Credentials, SigningParams, UNSIGNED_PAYLOAD, hash_payload, sign_parts};
use tracing::debug;

use crate::request::Request;

/// Attaches authentication to a request.
pub trait Signer: Send + Sync {
    /// Return `request` with authentication attached.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if the request cannot be signed.
    fn sign(&self, request: Request, credentials: &Credentials) -> Result<Request, AuthError>;
}

/// AWS Signature Version 4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureV4 {
    service: String,
    region: String,
    unsigned_payload: bool,
}

impl SignatureV4 {
    /// A signer that hashes the payload.
    pub fn new(service: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
            unsigned_payload: false,
        }
    }

    /// A signer that signs `UNSIGNED-PAYLOAD` and sends it as
    /// `x-amz-content-sha256`, for streamed bodies.
    pub fn unsigned_payload(service: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            unsigned_payload: true,
            ..Self::new(service, region)
        }
    }

    /// Signing name in the credential scope.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Region in the credential scope.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Whether the payload is left unsigned.
    #[must_use]
    pub fn is_unsigned_payload(&self) -> bool {
        self.unsigned_payload
    }

    /// Sign as of `time`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnhashablePayload`] when the standard variant is
    /// given a file-backed body, or any error from [`sign_parts`].
    pub fn sign_at(
        &self,
        request: Request,
        credentials: &Credentials,
        time: DateTime<Utc>,
    ) -> Result<Request, AuthError> {
        let payload_hash = if self.unsigned_payload {
            UNSIGNED_PAYLOAD.to_owned()
        } else {
            let bytes = request.body().as_bytes().ok_or(AuthError::UnhashablePayload)?;
            hash_payload(bytes)
        };

        let (mut parts, body) = request.into_parts();
        let params = SigningParams {
            credentials,
            region: &self.region,
            service: &self.service,
            time,
            payload_hash: &payload_hash,
            content_sha256_header: self.unsigned_payload,
        };
        let output = sign_parts(&mut parts, &params)?;
        debug!(
            service = %self.service,
            scope = %output.credential_scope,
            signed_headers = %output.signed_headers,
            "request signed"
        );
        Ok(Request::from_parts(parts, body))
    }
}

impl Signer for SignatureV4 {
    fn sign(&self, request: Request, credentials: &Credentials) -> Result<Request, AuthError> {
        self.sign_at(request, credentials, Utc::now())
    }
}

/// A signer that attaches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSigner;

impl Signer for AnonymousSigner {
    fn sign(&self, request: Request, _credentials: &Credentials) -> Result<Request, AuthError> {
        Ok(request)
    }
}

impl fmt::Display for SignatureV4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v4/{}/{}", self.service, self.region)
    }
}
