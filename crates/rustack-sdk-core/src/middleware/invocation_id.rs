use http::HeaderValue;
use http::header::HeaderName;
use uuid::Uuid;

use crate::command::Command;
use crate::handler::{Middleware, SharedHandler, handler_fn};
use crate::request::Request;

/// Header identifying one logical invocation across its retries.
pub const INVOCATION_ID_HEADER: &str = "amz-sdk-invocation-id";

/// Stamps a random `amz-sdk-invocation-id` on requests that lack one.
///
/// Placed outside the retry middleware, every attempt carries the same id.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationId;

impl InvocationId {
    fn apply(request: Request) -> Request {
        if request.has_header(INVOCATION_ID_HEADER) {
            return request;
        }
        let id = Uuid::new_v4().to_string();
        match HeaderValue::from_str(&id) {
            Ok(value) => request.with_header(HeaderName::from_static(INVOCATION_ID_HEADER), value),
            Err(_) => request,
        }
    }
}

impl Middleware for InvocationId {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        handler_fn(move |command: Command, request: Option<Request>| {
            next.call(command, request.map(Self::apply))
        })
    }
}
