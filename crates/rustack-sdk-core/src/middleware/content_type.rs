use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use http::HeaderValue;
use http::header::CONTENT_TYPE;
use mime::Mime;
use tracing::debug;

use crate::command::Command;
use crate::handler::{Middleware, SharedHandler, handler_fn};
use crate::request::Request;

/// Infer a MIME type from the extension of `path`.
///
/// Unknown or missing extensions map to `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use rustack_sdk_core::middleware::mime_from_path;
///
/// assert_eq!(mime_from_path("photo.png"), mime::IMAGE_PNG);
/// assert_eq!(mime_from_path("blob.xyz"), mime::APPLICATION_OCTET_STREAM);
/// ```
#[must_use]
pub fn mime_from_path(path: &str) -> Mime {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let essence = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("txt" | "log") => "text/plain",
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("csv") => "text/csv",
        Some("md") => "text/markdown",
        Some("js" | "mjs") => "text/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz" | "tgz") => "application/gzip",
        Some("tar") => "application/x-tar",
        Some("wasm") => "application/wasm",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => return mime::APPLICATION_OCTET_STREAM,
    };
    essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

/// Sets `Content-Type` from the body's file extension for selected operations.
///
/// Applies only when the operation is in the configured set, the request has
/// no `Content-Type`, and the body is backed by a file. Running it twice is a
/// no-op the second time.
#[derive(Debug, Clone)]
pub struct ContentType {
    operations: Arc<HashSet<String>>,
}

impl ContentType {
    /// Infer content types for `operations`.
    pub fn new<I, S>(operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operations: Arc::new(operations.into_iter().map(Into::into).collect()),
        }
    }

    fn apply(&self, command: &Command, request: Request) -> Request {
        if !self.operations.contains(command.name()) || request.content_type().is_some() {
            return request;
        }
        let Some(uri) = request.body().uri() else {
            return request;
        };

        let mime = mime_from_path(uri);
        debug!(operation = %command.name(), content_type = %mime, "inferred content type");
        match HeaderValue::from_str(mime.as_ref()) {
            Ok(value) => request.with_header(CONTENT_TYPE, value),
            Err(_) => request,
        }
    }
}

impl Middleware for ContentType {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        let this = self.clone();
        handler_fn(move |command: Command, request: Option<Request>| {
            let request = request.map(|request| this.apply(&command, request));
            next.call(command, request)
        })
    }
}
