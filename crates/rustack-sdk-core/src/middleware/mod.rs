//! The built-in middleware.
//!
//! | Middleware        | Step       | Effect                                           |
//! |-------------------|------------|--------------------------------------------------|
//! | [`SourceFile`]    | init       | swaps a source path for a lazily-opened body     |
//! | [`Validation`]    | validate   | rejects params that break the input shape        |
//! | [`RequestBuilder`]| build      | serializes the command into the request          |
//! | [`ContentType`]   | build      | infers `Content-Type` from the body's extension  |
//! | [`InvocationId`]  | build      | stamps `amz-sdk-invocation-id`                   |
//! | [`Signing`]       | sign       | signs the request                                |
//! | [`Retry`]         | sign       | re-attempts the inner chain                      |
//! | [`Tap`]           | any        | observes the command and request                 |
//! | [`map_command`], [`map_request`], [`map_result`] | any | pure transforms       |
//! | [`HistoryRecorder`] | any      | records start and finish in a history sink       |
//! | [`Timer`]         | any        | records elapsed time in the output metadata      |

mod build;
mod content_type;
mod history;
mod invocation_id;
mod map;
mod retry;
mod sign;
mod source_file;
mod tap;
mod timer;
mod validation;

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

pub use build::{RequestBuilder, Serializer};
pub use content_type::{ContentType, mime_from_path};
pub use history::HistoryRecorder;
pub use invocation_id::{INVOCATION_ID_HEADER, InvocationId};
pub use map::{map_command, map_request, map_result};
pub use retry::{Decider, DelayFn, Retry, THROTTLING_CODES, default_decider, exponential_delay};
pub use sign::{SignerSelector, Signing};
pub use source_file::SourceFile;
pub use tap::Tap;
pub use timer::Timer;
pub use validation::Validation;

/// Run an observer callback, logging and swallowing a panic.
///
/// Observers never change the outcome of the invocation they watch.
pub(crate) fn observe<R>(callback: &'static str, operation: &str, f: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(panic) => {
            warn!(
                callback,
                operation,
                panic = panic_message(panic.as_ref()),
                "observer callback panicked; continuing"
            );
            None
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
