//! Error types for the command pipeline.
//!
//! Every failure that leaves a handler is an [`SdkError`]: an [`ErrorKind`]
//! describing what went wrong plus the number of attempts the retry layer made
//! before giving up.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use rustack_sdk_auth::AuthError;

/// Convenience result type for pipeline operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// What went wrong.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The command parameters do not match the operation's input shape.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The API model has no operation with this name.
    #[error("Operation not found: {0}")]
    UnknownOperation(String),

    /// The command could not be turned into a request, or a response could
    /// not be turned into an output.
    #[error("Unable to serialize {operation}: {message}")]
    Serialization {
        /// The operation being serialized.
        operation: String,
        /// Why serialization failed.
        message: String,
    },

    /// The request could not be signed.
    #[error("Unable to sign request: {0}")]
    Signature(#[from] AuthError),

    /// The request never produced an HTTP response.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// The underlying I/O or connection error, when available.
        #[source]
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    /// The service answered with a non-2xx response.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The pipeline was assembled incorrectly.
    #[error("Internal pipeline error: {0}")]
    Internal(String),

    /// The invocation's future was dropped before it settled.
    #[error("Invocation cancelled before it settled")]
    Cancelled,
}

/// A failed command invocation.
#[derive(Debug, Clone)]
pub struct SdkError {
    kind: ErrorKind,
    attempts: u32,
}

impl SdkError {
    /// Wrap an error kind. The attempt count starts at one.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, attempts: 1 }
    }

    /// A serialization failure for `operation`.
    pub fn serialization(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization {
            operation: operation.into(),
            message: message.into(),
        })
    }

    /// A transport failure without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport {
            message: message.into(),
            source: None,
        })
    }

    /// A transport failure caused by `source`.
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::new(ErrorKind::Transport {
            message: message.into(),
            source: Some(Arc::new(source)),
        })
    }

    /// An operation missing from the API model.
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownOperation(name.into()))
    }

    /// A misassembled pipeline.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// An invocation dropped before it settled.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Consume the error, returning its kind.
    #[must_use]
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// How many attempts were made before this error was surfaced.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record the number of attempts made.
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// The service error, if the service answered.
    #[must_use]
    pub fn service_error(&self) -> Option<&ServiceError> {
        match &self.kind {
            ErrorKind::Service(err) => Some(err),
            _ => None,
        }
    }

    /// The validation error, if the parameters were rejected locally.
    #[must_use]
    pub fn validation_error(&self) -> Option<&ValidationError> {
        match &self.kind {
            ErrorKind::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the failure happened on the network.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport { .. })
    }
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts > 1 {
            write!(f, "{} (after {} attempts)", self.kind, self.attempts)
        } else {
            fmt::Display::fmt(&self.kind, f)
        }
    }
}

impl std::error::Error for SdkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<ErrorKind> for SdkError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<ValidationError> for SdkError {
    fn from(err: ValidationError) -> Self {
        Self::new(ErrorKind::Validation(err))
    }
}

impl From<AuthError> for SdkError {
    fn from(err: AuthError) -> Self {
        Self::new(ErrorKind::Signature(err))
    }
}

impl From<ServiceError> for SdkError {
    fn from(err: ServiceError) -> Self {
        Self::new(ErrorKind::Service(err))
    }
}

/// A non-2xx response from the service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {code}: {message}")]
pub struct ServiceError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Service error code, e.g. `ThrottlingException`.
    pub code: String,
    /// Human readable message from the service.
    pub message: String,
    /// The request id assigned by the service, if any.
    pub request_id: Option<String>,
}

impl ServiceError {
    /// Create a service error.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            request_id: None,
        }
    }

    /// Attach the service request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// The rule a parameter broke.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Rule {
    /// A required member is absent or null.
    Required,
    /// The value has the wrong JSON type.
    Type {
        /// The type the shape expects.
        expected: &'static str,
    },
    /// A string does not match the shape's pattern.
    Pattern(String),
    /// A number, or a length, is outside the allowed bounds.
    Range {
        /// What was measured (`value`, `length`).
        measure: &'static str,
        /// Lower bound, inclusive.
        min: Option<f64>,
        /// Upper bound, inclusive.
        max: Option<f64>,
        /// What was found.
        actual: f64,
    },
    /// A string is not one of the allowed values.
    Enum(Vec<String>),
}

/// One offending member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path to the member, e.g. `Item.Tags[2].Key`.
    pub path: String,
    /// The rule that was broken.
    pub rule: Rule,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        match &self.rule {
            Rule::Required => write!(f, "[{path}] is missing and is a required parameter"),
            Rule::Type { expected } => write!(f, "[{path}] must be of type {expected}"),
            Rule::Pattern(pattern) => {
                write!(f, "[{path}] must match the following regular expression: {pattern}")
            }
            Rule::Range {
                measure,
                min,
                max,
                actual,
            } => {
                write!(f, "[{path}] has a {measure} of {actual}, which is")?;
                match (min, max) {
                    (Some(min), Some(max)) => write!(f, " outside {min}..={max}"),
                    (Some(min), None) => write!(f, " less than {min}"),
                    (None, Some(max)) => write!(f, " greater than {max}"),
                    (None, None) => write!(f, " out of range"),
                }
            }
            Rule::Enum(allowed) => {
                write!(f, "[{path}] must be one of: {}", allowed.join(", "))
            }
        }
    }
}

// `Rule::Range` carries f64 bounds; they are never NaN.
impl Eq for Rule {}

/// Parameters rejected before the request was built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ValidationError {
    /// The operation that was being validated.
    pub operation: String,
    /// Every violation found, in traversal order.
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} error(s) while validating the input provided for the {} operation:",
            self.violations.len(),
            self.operation
        )?;
        for violation in &self.violations {
            write!(f, "\n{violation}")?;
        }
        Ok(())
    }
}
