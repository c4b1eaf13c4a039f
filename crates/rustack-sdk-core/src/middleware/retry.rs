//! Retrying the inner chain.
//!
//! Each invocation runs its own loop:
//!
//! ```text
//! ATTEMPT ──ok──▶ decider? ──no──▶ SUCCESS
//!    ▲    └─err─▶ decider? ──no──▶ TERMINAL_FAILURE
//!    │                 │yes
//!    └── sleep(delay(retries)) ◀── retries += 1
//! ```
//!
//! The loop itself imposes no limit; the decider owns the cutoff.

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use tracing::{debug, warn};

use crate::command::Command;
use crate::error::{ErrorKind, SdkError};
use crate::handler::{Middleware, SharedHandler, handler_fn};
use crate::output::Output;
use crate::request::Request;

/// Decides whether to retry: `(retries so far, command, request, outcome)`.
pub type Decider =
    Arc<dyn Fn(u32, &Command, Option<&Request>, Result<&Output, &SdkError>) -> bool + Send + Sync>;

/// Delay before the given retry number (starting at 1).
pub type DelayFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Service error codes treated as throttling.
pub const THROTTLING_CODES: &[&str] = &[
    "RequestLimitExceeded",
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "ProvisionedThroughputExceededException",
    "RequestThrottled",
    "BandwidthLimitExceeded",
    "RequestThrottledException",
    "TooManyRequestsException",
    "IDPCommunicationError",
    "EC2ThrottledException",
    "TransactionInProgressException",
    "SlowDown",
    "PriorRequestNotComplete",
];

/// Retry transport failures, 5xx and 429 responses and throttling codes,
/// while fewer than `max_retries` retries have been made.
///
/// Validation, serialization, signing and internal errors are never retried,
/// and neither is a successful output.
#[must_use]
pub fn default_decider(max_retries: u32) -> Decider {
    Arc::new(
        move |retries: u32,
              _command: &Command,
              _request: Option<&Request>,
              outcome: Result<&Output, &SdkError>| {
            retries < max_retries && outcome.err().is_some_and(is_retryable)
        },
    )
}

fn is_retryable(err: &SdkError) -> bool {
    match err.kind() {
        ErrorKind::Transport { .. } => true,
        ErrorKind::Service(service) => {
            service.status.is_server_error()
                || service.status == StatusCode::TOO_MANY_REQUESTS
                || THROTTLING_CODES.contains(&service.code.as_str())
        }
        _ => false,
    }
}

/// Full-jitter exponential backoff: `random(0..=2^retries) * base`, capped at
/// `max`.
#[must_use]
pub fn exponential_delay(base: Duration, max: Duration) -> DelayFn {
    Arc::new(move |retries| {
        let ceiling = 1_u32.checked_shl(retries.min(31)).unwrap_or(u32::MAX);
        let factor = rand::random_range(0..=ceiling);
        base.checked_mul(factor).map_or(max, |delay| delay.min(max))
    })
}

/// Re-runs the inner chain while the decider says so.
#[derive(Clone)]
pub struct Retry {
    decider: Decider,
    delay: DelayFn,
}

impl Retry {
    /// Retry with an explicit decider and delay.
    pub fn new(decider: Decider, delay: DelayFn) -> Self {
        Self { decider, delay }
    }
}

impl std::fmt::Debug for Retry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retry").finish_non_exhaustive()
    }
}

impl Middleware for Retry {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        let this = self.clone();
        handler_fn(move |command: Command, request: Option<Request>| {
            let next = Arc::clone(&next);
            let this = this.clone();
            async move {
                let mut retries = 0_u32;
                loop {
                    let outcome = next.call(command.clone(), request.clone()).await;
                    let again = (this.decider)(
                        retries,
                        &command,
                        request.as_ref(),
                        outcome.as_ref(),
                    );

                    if !again {
                        return match outcome {
                            Ok(mut output) => {
                                output.metadata_mut().retries = retries;
                                Ok(output)
                            }
                            Err(err) => {
                                debug!(
                                    operation = %command.name(),
                                    attempts = retries + 1,
                                    "giving up"
                                );
                                Err(err.with_attempts(retries + 1))
                            }
                        };
                    }

                    retries += 1;
                    let delay = (this.delay)(retries);
                    match &outcome {
                        Ok(_) => warn!(
                            operation = %command.name(),
                            attempt = retries,
                            delay_ms = delay.as_millis(),
                            "retrying successful response"
                        ),
                        Err(err) => warn!(
                            operation = %command.name(),
                            attempt = retries,
                            delay_ms = delay.as_millis(),
                            error = %err,
                            "retrying failed attempt"
                        ),
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use parking_lot::Mutex;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::error::ServiceError;

    /// A terminal handler that fails with "attempt N" for each call.
    fn failing(calls: &Arc<AtomicU32>) -> SharedHandler {
        let calls = Arc::clone(calls);
        handler_fn(move |_command, _request| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(SdkError::transport(format!("attempt {n}"))) }
        })
    }

    fn recording_delay(log: &Arc<Mutex<Vec<u32>>>) -> DelayFn {
        let log = Arc::clone(log);
        Arc::new(move |retries| {
            log.lock().push(retries);
            Duration::from_millis(100)
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_retry_until_decider_stops() {
        let calls = Arc::new(AtomicU32::new(0));
        let delays = Arc::new(Mutex::new(Vec::new()));
        let answers = Arc::new(Mutex::new(vec![true, true, false].into_iter()));
        let decider: Decider = Arc::new(move |_, _, _, _| answers.lock().next().unwrap_or(false));

        let handler = Retry::new(decider, recording_delay(&delays)).wrap(failing(&calls));
        let err = assert_err!(handler.call(Command::new("Op"), None).await);

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*delays.lock(), [1, 2]);
        assert_eq!(err.attempts(), 3);
        assert!(matches!(
            err.kind(),
            ErrorKind::Transport { message, .. } if message == "attempt 3"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_retry_successful_output_when_decider_asks() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let terminal = handler_fn(move |_command, _request| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(Output::new().with("Attempt", n)) }
        });
        let decider: Decider = Arc::new(|retries, _, _, outcome| outcome.is_ok() && retries == 0);
        let delay: DelayFn = Arc::new(|_| Duration::from_secs(1));

        let handler = Retry::new(decider, delay).wrap(terminal);
        let output = assert_ok!(handler.call(Command::new("Op"), None).await);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(output.get("Attempt"), Some(&serde_json::json!(2)));
        assert_eq!(output.metadata().retries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_sleep_between_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let delays = Arc::new(Mutex::new(Vec::new()));
        let handler =
            Retry::new(default_decider(2), recording_delay(&delays)).wrap(failing(&calls));

        let started = tokio::time::Instant::now();
        let err = handler.call(Command::new("Op"), None).await.unwrap_err();

        assert_eq!(err.attempts(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_should_keep_attempt_state_per_invocation() {
        let calls = Arc::new(AtomicU32::new(0));
        let delay: DelayFn = Arc::new(|_| Duration::ZERO);
        let handler = Retry::new(default_decider(1), delay).wrap(failing(&calls));

        let (a, b) = tokio::join!(
            handler.call(Command::new("A"), None),
            handler.call(Command::new("B"), None)
        );

        assert_eq!(a.unwrap_err().attempts(), 2);
        assert_eq!(b.unwrap_err().attempts(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_should_classify_retryable_errors() {
        let decider = default_decider(3);
        let command = Command::new("Op");
        let decide = |err: SdkError| decider(0, &command, None, Err(&err));

        assert!(decide(SdkError::transport("reset")));
        assert!(decide(
            ServiceError::new(StatusCode::BAD_GATEWAY, "BadGateway", "").into()
        ));
        assert!(decide(
            ServiceError::new(StatusCode::TOO_MANY_REQUESTS, "Whatever", "").into()
        ));
        assert!(decide(
            ServiceError::new(StatusCode::BAD_REQUEST, "ThrottlingException", "").into()
        ));
        assert!(!decide(
            ServiceError::new(StatusCode::BAD_REQUEST, "ValidationException", "").into()
        ));
        assert!(!decide(SdkError::serialization("Op", "bad")));
        assert!(!decide(SdkError::internal("bad")));
        assert!(!decider(0, &command, None, Ok(&Output::new())));
        assert!(!decider(3, &command, None, Err(&SdkError::transport("reset"))));
    }

    #[test]
    fn test_should_bound_exponential_delay() {
        let delay = exponential_delay(Duration::from_millis(100), Duration::from_secs(2));
        for retries in 1..=40 {
            let d = delay(retries);
            assert!(d <= Duration::from_secs(2));
            if retries <= 4 {
                assert!(d <= Duration::from_millis(100) * (1_u32 << retries));
            }
        }
    }
}
