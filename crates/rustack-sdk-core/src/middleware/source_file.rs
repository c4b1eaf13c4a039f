use std::sync::Arc;

use tracing::debug;

use crate::body::Body;
use crate::command::{Command, Param};
use crate::handler::{Middleware, SharedHandler, handler_fn};
use crate::model::ServiceModel;

/// Replaces a source path parameter with a lazily-opened body.
///
/// When the command's source parameter (default `SourceFile`) holds a string
/// and the operation's input declares the body member (default `Body`), the
/// body becomes [`Body::File`] over that path and the source parameter is
/// removed. The file is not opened here. Anything else passes through.
#[derive(Debug, Clone)]
pub struct SourceFile {
    model: Arc<ServiceModel>,
    source_param: String,
    body_param: String,
}

impl SourceFile {
    /// Resolve `SourceFile` into `Body`.
    #[must_use]
    pub fn new(model: Arc<ServiceModel>) -> Self {
        Self::with_params(model, "SourceFile", "Body")
    }

    /// Resolve `source_param` into `body_param`.
    pub fn with_params(
        model: Arc<ServiceModel>,
        source_param: impl Into<String>,
        body_param: impl Into<String>,
    ) -> Self {
        Self {
            model,
            source_param: source_param.into(),
            body_param: body_param.into(),
        }
    }

    fn resolve(&self, command: &mut Command) {
        let Some(source) = command
            .get(&self.source_param)
            .and_then(Param::as_str)
            .map(str::to_owned)
        else {
            return;
        };
        let declares_body = self
            .model
            .operation(command.name())
            .is_some_and(|op| op.has_member(&self.body_param));
        if !declares_body {
            return;
        }

        debug!(operation = %command.name(), source = %source, "streaming body from source file");
        command.set(self.body_param.clone(), Body::from_path(source));
        command.remove(&self.source_param);
    }
}

impl Middleware for SourceFile {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        let this = self.clone();
        handler_fn(move |mut command, request| {
            this.resolve(&mut command);
            next.call(command, request)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use parking_lot::Mutex;
    use serde_json::Value;

    use super::*;
    use crate::model::fixtures::storage_model;
    use crate::output::Output;

    fn capture() -> (SharedHandler, Arc<Mutex<Option<Command>>>) {
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        let terminal = handler_fn(move |command, _request| {
            *slot.lock() = Some(command);
            async { Ok(Output::new()) }
        });
        (terminal, seen)
    }

    #[tokio::test]
    async fn test_should_replace_source_with_lazy_body() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"payload").unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let (terminal, seen) = capture();
        let handler = SourceFile::new(Arc::new(storage_model())).wrap(terminal);
        let command = Command::new("PutObject")
            .param("Bucket", "b")
            .param("SourceFile", path.as_str());
        handler.call(command, None).await.unwrap();

        let seen = seen.lock().take().unwrap();
        assert!(!seen.contains("SourceFile"));
        let body = seen.get("Body").and_then(Param::as_body).unwrap();
        assert!(body.is_streaming());
        assert_eq!(body.uri(), Some(path.as_str()));
    }

    #[tokio::test]
    async fn test_should_leave_command_when_body_not_declared() {
        let (terminal, seen) = capture();
        let handler = SourceFile::new(Arc::new(storage_model())).wrap(terminal);
        let command = Command::new("ListObjects")
            .param("Bucket", "b")
            .param("SourceFile", "file.txt");
        handler.call(command.clone(), None).await.unwrap();

        assert_eq!(seen.lock().take(), Some(command));
    }

    #[tokio::test]
    async fn test_should_ignore_null_source() {
        let (terminal, seen) = capture();
        let handler = SourceFile::new(Arc::new(storage_model())).wrap(terminal);
        let command = Command::new("PutObject").param("SourceFile", Value::Null);
        handler.call(command.clone(), None).await.unwrap();

        assert_eq!(seen.lock().take(), Some(command));
    }

    #[tokio::test]
    async fn test_should_honour_custom_param_names() {
        let (terminal, seen) = capture();
        let handler = SourceFile::with_params(Arc::new(storage_model()), "Path", "Body").wrap(terminal);
        handler
            .call(Command::new("PutObject").param("Path", "photo.png"), None)
            .await
            .unwrap();

        let seen = seen.lock().take().unwrap();
        assert!(!seen.contains("Path"));
        assert_eq!(
            seen.get("Body").and_then(Param::as_body).and_then(Body::uri),
            Some("photo.png")
        );
    }
}
