//! AWS Signature Version 4 signing.
//!
//! Signing an outgoing request takes five steps:
//!
//! 1. Stamp the request with `host`, `x-amz-date` and, when present, the
//!    session token and the `x-amz-content-sha256` header.
//! 2. Build the [`CanonicalRequest`] from the stamped request.
//! 3. Build the string to sign from the timestamp, credential scope, and
//!    canonical request hash.
//! 4. Derive the signing key with the HMAC-SHA256 chain over the scope.
//! 5. Attach the `Authorization` header.
//!
//! The entry point is [`sign_parts`].

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::canonical::CanonicalRequest;
use crate::credentials::Credentials;
use crate::error::AuthError;

/// The signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Payload hash placeholder for bodies that are streamed instead of hashed.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Header carrying the signing timestamp.
pub const X_AMZ_DATE: &str = "x-amz-date";

/// Header carrying the payload hash for services that require it (S3).
pub const X_AMZ_CONTENT_SHA256: &str = "x-amz-content-sha256";

/// Header carrying the session token of temporary credentials.
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

type HmacSha256 = Hmac<Sha256>;

/// Everything needed to sign one request besides the request itself.
#[derive(Debug, Clone)]
pub struct SigningParams<'a> {
    /// Credentials to sign with.
    pub credentials: &'a Credentials,
    /// Region in the credential scope.
    pub region: &'a str,
    /// Signing name of the service in the credential scope.
    pub service: &'a str,
    /// Signing time; becomes `x-amz-date`.
    pub time: DateTime<Utc>,
    /// Hex SHA-256 of the payload, or [`UNSIGNED_PAYLOAD`].
    pub payload_hash: &'a str,
    /// Whether to send the payload hash as `x-amz-content-sha256`.
    pub content_sha256_header: bool,
}

/// What was signed, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningOutput {
    /// The hex-encoded signature.
    pub signature: String,
    /// The `SignedHeaders` list.
    pub signed_headers: String,
    /// The `date/region/service/aws4_request` scope.
    pub credential_scope: String,
}

/// Sign request parts in place.
///
/// # Errors
///
/// Returns [`AuthError::ExpiredCredentials`] for expired credentials,
/// [`AuthError::MissingHost`] if the URI has no authority and no `host`
/// header is set, or [`AuthError::InvalidHeaderValue`] if a computed header
/// cannot be represented.
pub fn sign_parts(
    parts: &mut http::request::Parts,
    params: &SigningParams<'_>,
) -> Result<SigningOutput, AuthError> {
    let credentials = params.credentials;
    if credentials.is_expired_at(params.time) {
        return Err(AuthError::ExpiredCredentials(
            credentials.access_key_id().to_owned(),
        ));
    }

    let timestamp = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.time.format("%Y%m%d").to_string();

    if !parts.headers.contains_key(http::header::HOST) {
        let authority = parts
            .uri
            .authority()
            .map(|authority| authority.as_str().to_owned())
            .ok_or_else(|| AuthError::MissingHost(parts.uri.to_string()))?;
        insert_header(parts, "host", &authority)?;
    }
    insert_header(parts, X_AMZ_DATE, &timestamp)?;
    if let Some(token) = credentials.session_token() {
        insert_header(parts, X_AMZ_SECURITY_TOKEN, token)?;
    }
    if params.content_sha256_header {
        insert_header(parts, X_AMZ_CONTENT_SHA256, params.payload_hash)?;
    }

    let canonical = CanonicalRequest::from_parts(parts, params.payload_hash);
    debug!(canonical_request = %canonical, "built canonical request");

    let credential_scope = format!(
        "{date}/{}/{}/aws4_request",
        params.region, params.service
    );
    let string_to_sign = build_string_to_sign(&timestamp, &credential_scope, &canonical.hash());
    let signing_key = derive_signing_key(
        credentials.secret_access_key(),
        &date,
        params.region,
        params.service,
    );
    let signature = compute_signature(&signing_key, &string_to_sign);
    let signed_headers = canonical.signed_headers();

    let authorization = format!(
        "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id()
    );
    insert_header(parts, "authorization", &authorization)?;

    debug!(
        access_key_id = credentials.access_key_id(),
        %credential_scope,
        %signed_headers,
        "signed request"
    );

    Ok(SigningOutput {
        signature,
        signed_headers,
        credential_scope,
    })
}

/// Build the SigV4 string to sign.
///
/// # Examples
///
/// ```
/// use rustack_sdk_auth::sigv4::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20130524T000000Z",
///     "20130524/us-east-1/s3/aws4_request",
///     "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20130524T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the SigV4 signing key.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, b"aws4_request")
}

/// Hex-encoded HMAC-SHA256 of `data` under `signing_key`.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}

/// Hex-encoded SHA-256 of a payload.
///
/// # Examples
///
/// ```
/// use rustack_sdk_auth::sigv4::hash_payload;
///
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

fn insert_header(
    parts: &mut http::request::Parts,
    name: &'static str,
    value: &str,
) -> Result<(), AuthError> {
    let value = http::HeaderValue::from_str(value)
        .map_err(|_| AuthError::InvalidHeaderValue(name.to_owned()))?;
    parts
        .headers
        .insert(http::HeaderName::from_static(name), value);
    Ok(())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
