use std::sync::Arc;

use tracing::debug;

use crate::command::Command;
use crate::error::{SdkError, SdkResult};
use crate::handler::{Middleware, SharedHandler, handler_fn, reject};
use crate::model::{ServiceModel, Validator};

/// Rejects commands whose parameters do not match the operation's input.
///
/// The inner handler is never called for an invalid command, or for an
/// operation the model does not define.
#[derive(Clone)]
pub struct Validation {
    model: Arc<ServiceModel>,
    validator: Arc<dyn Validator>,
}

impl Validation {
    /// Validate against `model` with `validator`.
    pub fn new(model: Arc<ServiceModel>, validator: Arc<dyn Validator>) -> Self {
        Self { model, validator }
    }

    fn check(&self, command: &Command) -> SdkResult<()> {
        let operation = self
            .model
            .operation(command.name())
            .ok_or_else(|| SdkError::unknown_operation(command.name()))?;
        self.validator.validate(&operation, command.params())?;
        Ok(())
    }
}

impl std::fmt::Debug for Validation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validation")
            .field("service", &self.model.metadata.service_id)
            .finish_non_exhaustive()
    }
}

impl Middleware for Validation {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        let this = self.clone();
        handler_fn(move |command: Command, request| {
            if let Err(err) = this.check(&command) {
                debug!(operation = %command.name(), error = %err, "command rejected by validation");
                return reject(err);
            }
            next.call(command, request)
        })
    }
}
