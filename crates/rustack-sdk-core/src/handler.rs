//! Handlers, middleware, and how they compose.
//!
//! A [`Handler`] takes a command (and, once one has been built, a request) and
//! returns a boxed future of the outcome. A [`Middleware`] wraps one handler in
//! another. Folding a list of middleware around a terminal handler with
//! [`compose`] yields a single handler:
//!
//! ```text
//! compose([m1, m2, m3], terminal) == m1(m2(m3(terminal)))
//!
//! call ──▶ m1 before ─▶ m2 before ─▶ m3 before ─▶ terminal
//!                                                     │
//! result ◀─ m1 after ◀─ m2 after ◀─ m3 after ◀────────┘
//! ```
//!
//! Before-logic runs synchronously inside [`Handler::call`]; after-logic runs
//! when the inner future resolves, so it unwinds in reverse order.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::command::Command;
use crate::error::SdkError;
use crate::output::Output;
use crate::request::Request;

/// The future every handler returns.
pub type HandlerFuture = BoxFuture<'static, Result<Output, SdkError>>;

/// A handler shared between the middleware that wraps it and concurrent calls.
pub type SharedHandler = Arc<dyn Handler>;

/// A middleware shared between handler lists.
pub type SharedMiddleware = Arc<dyn Middleware>;

/// One stage of the pipeline.
///
/// `request` is `None` until the request-building middleware has run.
pub trait Handler: Send + Sync + 'static {
    /// Process a command.
    fn call(&self, command: Command, request: Option<Request>) -> HandlerFuture;
}

/// Wraps a handler to produce another handler.
///
/// Implemented for every `Fn(SharedHandler) -> SharedHandler`, so a closure is
/// a valid middleware.
pub trait Middleware: Send + Sync + 'static {
    /// Wrap `next`.
    fn wrap(&self, next: SharedHandler) -> SharedHandler;
}

impl<F> Middleware for F
where
    F: Fn(SharedHandler) -> SharedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        self(next)
    }
}

/// Fold `middlewares` around `terminal`; the first middleware is outermost.
#[must_use]
pub fn compose<'a, I>(middlewares: I, terminal: SharedHandler) -> SharedHandler
where
    I: IntoIterator<Item = &'a SharedMiddleware>,
    I::IntoIter: DoubleEndedIterator,
{
    middlewares
        .into_iter()
        .rev()
        .fold(terminal, |next, middleware| middleware.wrap(next))
}

/// Turn an async function into a [`SharedHandler`].
///
/// # Examples
///
/// ```
/// use rustack_sdk_core::{Command, Output, handler_fn};
///
/// let terminal = handler_fn(|command: Command, _request| async move {
///     Ok(Output::new().with("Operation", command.name()))
/// });
/// # let _ = terminal;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(Command, Option<Request>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Output, SdkError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

struct FnHandler<F>(F);

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Command, Option<Request>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Output, SdkError>> + Send + 'static,
{
    fn call(&self, command: Command, request: Option<Request>) -> HandlerFuture {
        Box::pin((self.0)(command, request))
    }
}

/// A handler future that has already failed.
pub(crate) fn reject(err: SdkError) -> HandlerFuture {
    Box::pin(futures::future::ready(Err(err)))
}
