use std::sync::Arc;

use crate::command::Command;
use crate::handler::{Middleware, SharedHandler, handler_fn};
use crate::request::Request;

use super::observe;

type TapFn = dyn Fn(&Command, Option<&Request>) + Send + Sync;

/// Calls an observer with the command and request before forwarding them.
///
/// The observer only sees borrows, so it cannot change what is forwarded, and
/// it never touches the result. A panicking observer is logged and ignored.
#[derive(Clone)]
pub struct Tap {
    callback: Arc<TapFn>,
}

impl Tap {
    /// Observe with `callback`.
    pub fn new(callback: impl Fn(&Command, Option<&Request>) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl std::fmt::Debug for Tap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tap").finish_non_exhaustive()
    }
}

impl Middleware for Tap {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        let callback = Arc::clone(&self.callback);
        handler_fn(move |command: Command, request: Option<Request>| {
            observe("tap", command.name(), || callback(&command, request.as_ref()));
            next.call(command, request)
        })
    }
}
