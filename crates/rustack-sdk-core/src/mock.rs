//! A queue-backed terminal handler for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::command::Command;
use crate::error::SdkError;
use crate::handler::{Handler, HandlerFuture};
use crate::output::Output;
use crate::request::Request;

/// Answers each call with the next queued outcome.
///
/// Records the last command and request it saw. Calling it with an empty
/// queue fails with an internal error.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use rustack_sdk_core::{Command, Handler, MockHandler, Output};
///
/// # tokio_test::block_on(async {
/// let mock = Arc::new(MockHandler::new());
/// mock.push_ok(Output::new().with("Answer", 42));
///
/// let output = mock.call(Command::new("Ask"), None).await.unwrap();
/// assert_eq!(output.get("Answer"), Some(&serde_json::json!(42)));
/// assert_eq!(mock.last_command().unwrap().name(), "Ask");
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MockHandler {
    queue: Mutex<VecDeque<Result<Output, SdkError>>>,
    last_command: Mutex<Option<Command>>,
    last_request: Mutex<Option<Request>>,
    calls: AtomicUsize,
}

impl MockHandler {
    /// An empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock preloaded with `outcomes`.
    #[must_use]
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = Result<Output, SdkError>>) -> Self {
        let mock = Self::new();
        mock.queue.lock().extend(outcomes);
        mock
    }

    /// Queue an outcome.
    pub fn push(&self, outcome: Result<Output, SdkError>) {
        self.queue.lock().push_back(outcome);
    }

    /// Queue a success.
    pub fn push_ok(&self, output: Output) {
        self.push(Ok(output));
    }

    /// Queue a failure.
    pub fn push_err(&self, err: impl Into<SdkError>) {
        self.push(Err(err.into()));
    }

    /// Outcomes still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.lock().len()
    }

    /// How many times the mock was called.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The last command received.
    #[must_use]
    pub fn last_command(&self) -> Option<Command> {
        self.last_command.lock().clone()
    }

    /// The last request received.
    #[must_use]
    pub fn last_request(&self) -> Option<Request> {
        self.last_request.lock().clone()
    }
}

impl Handler for MockHandler {
    fn call(&self, command: Command, request: Option<Request>) -> HandlerFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.queue.lock().pop_front().unwrap_or_else(|| {
            Err(SdkError::internal(format!(
                "mock queue is empty; nothing to answer {}",
                command.name()
            )))
        });
        debug!(operation = %command.name(), ok = outcome.is_ok(), "mock answering");

        *self.last_command.lock() = Some(command);
        *self.last_request.lock() = request;
        Box::pin(futures::future::ready(outcome))
    }
}
