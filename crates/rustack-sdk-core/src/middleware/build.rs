use std::sync::Arc;

use tracing::debug;

use crate::command::Command;
use crate::error::SdkResult;
use crate::handler::{Middleware, SharedHandler, handler_fn, reject};
use crate::request::Request;

/// Turns a command into a wire request.
pub trait Serializer: Send + Sync {
    /// Serialize `command`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the command cannot be represented.
    fn serialize(&self, command: &Command) -> SdkResult<Request>;
}

impl<F> Serializer for F
where
    F: Fn(&Command) -> SdkResult<Request> + Send + Sync,
{
    fn serialize(&self, command: &Command) -> SdkResult<Request> {
        self(command)
    }
}

/// Introduces the request into the pipeline.
///
/// Stages outside this one see no request; stages inside it always do. A
/// request already present is replaced.
#[derive(Clone)]
pub struct RequestBuilder {
    serializer: Arc<dyn Serializer>,
}

impl RequestBuilder {
    /// Build requests with `serializer`.
    pub fn new(serializer: Arc<dyn Serializer>) -> Self {
        Self { serializer }
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder").finish_non_exhaustive()
    }
}

impl Middleware for RequestBuilder {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        let serializer = Arc::clone(&self.serializer);
        handler_fn(move |command: Command, _request| {
            match serializer.serialize(&command) {
                Ok(request) => {
                    debug!(
                        operation = %command.name(),
                        method = %request.method(),
                        uri = %request.uri(),
                        "request built"
                    );
                    next.call(command, Some(request))
                }
                Err(err) => reject(err),
            }
        })
    }
}
