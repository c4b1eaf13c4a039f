//! Pure transforms of the command, the request, or the successful output.

use std::sync::Arc;

use crate::command::Command;
use crate::handler::{SharedHandler, SharedMiddleware, handler_fn};
use crate::output::Output;
use crate::request::Request;

/// Apply `f` to the command before forwarding it.
pub fn map_command<F>(f: F) -> SharedMiddleware
where
    F: Fn(Command) -> Command + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: SharedHandler| -> SharedHandler {
        let f = Arc::clone(&f);
        handler_fn(move |command, request| next.call(f(command), request))
    })
}

/// Apply `f` to the request, when there is one, before forwarding it.
pub fn map_request<F>(f: F) -> SharedMiddleware
where
    F: Fn(Request) -> Request + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: SharedHandler| -> SharedHandler {
        let f = Arc::clone(&f);
        handler_fn(move |command, request: Option<Request>| {
            next.call(command, request.map(|r| f(r)))
        })
    })
}

/// Apply `f` to the output once the inner handler succeeds.
///
/// Failures pass through untouched.
pub fn map_result<F>(f: F) -> SharedMiddleware
where
    F: Fn(Output) -> Output + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: SharedHandler| -> SharedHandler {
        let f = Arc::clone(&f);
        handler_fn(move |command, request| {
            let inner = next.call(command, request);
            let f = Arc::clone(&f);
            async move { inner.await.map(|output| f(output)) }
        })
    })
}
