//! Command middleware pipeline for the rustack SDK.
//!
//! A [`Command`] (an operation name plus parameters) travels through a chain of
//! middleware folded around a terminal handler that sends the request:
//!
//! ```text
//! Client::execute(command)
//!   │
//!   ├─ init      history ▸ timer ▸ source_file
//!   ├─ validate  validation
//!   ├─ build     builder ▸ content_type ▸ invocation_id
//!   ├─ sign      signer ▸ retry
//!   ▼
//! transport ──▶ Result<Output, SdkError>
//! ```
//!
//! Each middleware may change the command or request on the way in, observe
//! or map the outcome on the way out, or reject early. Only [`middleware::Retry`]
//! turns a rejection into another attempt.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use rustack_sdk_core::{Command, Output, compose, handler_fn, middleware};
//!
//! # tokio_test::block_on(async {
//! let terminal = handler_fn(|command: Command, _request| async move {
//!     Ok(Output::new().with("Operation", command.name()))
//! });
//! let tag = middleware::map_result(|output| output.with("Tagged", true));
//! let handler = compose([&tag], terminal);
//!
//! let output = handler.call(Command::new("Ping"), None).await.unwrap();
//! assert_eq!(output.get("Tagged"), Some(&serde_json::json!(true)));
//! # });
//! ```

pub mod body;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod handler_list;
pub mod history;
pub mod middleware;
pub mod mock;
pub mod model;
pub mod output;
pub mod protocol;
pub mod request;
pub mod signer;

pub use body::Body;
pub use client::{Client, ClientBuilder};
pub use command::{Command, Param, Params};
pub use config::{RetryConfig, SdkConfig};
pub use error::{ErrorKind, Rule, SdkError, SdkResult, ServiceError, ValidationError, Violation};
pub use handler::{
    Handler, HandlerFuture, Middleware, SharedHandler, SharedMiddleware, compose, handler_fn,
};
pub use handler_list::{HandlerList, Step};
pub use history::{Entry, History, HistorySink, Ticket};
pub use mock::MockHandler;
pub use model::{OperationShape, ParamValidator, ServiceModel, Validator};
pub use output::{Metadata, Output};
pub use request::Request;
pub use signer::{AnonymousSigner, SignatureV4, Signer};
