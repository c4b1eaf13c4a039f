//! AWS credentials and Signature Version 4 request signing for the rustack SDK.
//!
//! This crate is the signing side of SigV4: given an outgoing request and a set
//! of credentials, it stamps the request with the headers the service needs to
//! authenticate it.
//!
//! # Usage
//!
//! ```rust
//! use rustack_sdk_auth::credentials::Credentials;
//! use rustack_sdk_auth::sigv4::{SigningParams, hash_payload, sign_parts};
//!
//! let credentials = Credentials::new("AKIDEXAMPLE", "secret");
//! let (mut parts, ()) = http::Request::builder()
//!     .method("POST")
//!     .uri("https://dynamodb.us-east-1.amazonaws.com/")
//!     .body(())
//!     .unwrap()
//!     .into_parts();
//!
//! let payload_hash = hash_payload(b"{}");
//! sign_parts(
//!     &mut parts,
//!     &SigningParams {
//!         credentials: &credentials,
//!         region: "us-east-1",
//!         service: "dynamodb",
//!         time: chrono::Utc::now(),
//!         payload_hash: &payload_hash,
//!         content_sha256_header: false,
//!     },
//! )
//! .unwrap();
//! assert!(parts.headers.contains_key("authorization"));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction
//! - [`credentials`] - Credentials and credential providers
//! - [`error`] - Signing error types
//! - [`sigv4`] - SigV4 signing

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod sigv4;

pub use credentials::{
    CredentialProvider, Credentials, EnvCredentialProvider, StaticCredentialProvider,
};
pub use error::AuthError;
pub use sigv4::{SigningOutput, SigningParams, UNSIGNED_PAYLOAD, hash_payload, sign_parts};
