use tokio::time::Instant;
use tracing::debug;

use crate::command::Command;
use crate::handler::{Middleware, SharedHandler, handler_fn};
use crate::request::Request;

/// Records the time spent inside it as [`Metadata::total_time`].
///
/// [`Metadata::total_time`]: crate::output::Metadata::total_time
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer;

impl Middleware for Timer {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        handler_fn(move |command: Command, request: Option<Request>| {
            let started = Instant::now();
            let operation = command.name().to_owned();
            let inner = next.call(command, request);
            async move {
                let outcome = inner.await;
                let elapsed = started.elapsed();
                debug!(
                    operation = %operation,
                    elapsed_ms = elapsed.as_millis(),
                    ok = outcome.is_ok(),
                    "invocation finished"
                );
                outcome.map(|mut output| {
                    output.metadata_mut().total_time = Some(elapsed);
                    output
                })
            }
        })
    }
}
