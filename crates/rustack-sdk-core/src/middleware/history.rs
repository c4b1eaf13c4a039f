use std::sync::Arc;

use tracing::debug;

use crate::command::Command;
use crate::error::SdkError;
use crate::handler::{Middleware, SharedHandler, handler_fn};
use crate::history::{HistorySink, Ticket};
use crate::output::Output;
use crate::request::Request;

use super::observe;

/// Records every invocation in a [`HistorySink`].
///
/// `start` runs before forwarding and `finish` runs once the inner future
/// settles, on success and on failure alike. If the future is dropped first
/// (e.g. under `tokio::time::timeout`), the entry is finished with
/// [`ErrorKind::Cancelled`](crate::error::ErrorKind::Cancelled). The original
/// outcome is always passed on; a panicking sink is logged and ignored.
#[derive(Clone)]
pub struct HistoryRecorder {
    sink: Arc<dyn HistorySink>,
}

impl HistoryRecorder {
    /// Record into `sink`.
    pub fn new(sink: Arc<dyn HistorySink>) -> Self {
        Self { sink }
    }
}

impl std::fmt::Debug for HistoryRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryRecorder").finish_non_exhaustive()
    }
}

impl Middleware for HistoryRecorder {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        let sink = Arc::clone(&self.sink);
        handler_fn(move |command: Command, request: Option<Request>| {
            let operation = command.name().to_owned();
            let ticket = observe("history.start", &operation, || {
                sink.start(&command, request.as_ref())
            });
            let mut pending = Pending {
                sink: Arc::clone(&sink),
                ticket,
                operation,
            };
            let inner = next.call(command, request);
            async move {
                let outcome = inner.await;
                pending.finish(&outcome);
                outcome
            }
        })
    }
}

/// A started entry that has not been finished yet.
///
/// Finishes the entry as cancelled if dropped while still open.
struct Pending {
    sink: Arc<dyn HistorySink>,
    ticket: Option<Ticket>,
    operation: String,
}

impl Pending {
    fn finish(&mut self, outcome: &Result<Output, SdkError>) {
        if let Some(ticket) = self.ticket.take() {
            observe("history.finish", &self.operation, || {
                self.sink.finish(ticket, outcome);
            });
        }
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if self.ticket.is_some() {
            debug!(operation = %self.operation, "invocation dropped before settling");
            self.finish(&Err(SdkError::cancelled()));
        }
    }
}
