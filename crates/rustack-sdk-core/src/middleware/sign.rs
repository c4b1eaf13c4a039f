use std::sync::Arc;

use rustack_sdk_auth::CredentialProvider;
use tracing::debug;

use crate::command::Command;
use crate::error::{SdkError, SdkResult};
use crate::handler::{Middleware, SharedHandler, handler_fn, reject};
use crate::request::Request;
use crate::signer::Signer;

/// Picks the signer for a command, so operations can use different variants.
pub type SignerSelector = Arc<dyn Fn(&Command) -> Arc<dyn Signer> + Send + Sync>;

/// Signs the built request before forwarding it.
#[derive(Clone)]
pub struct Signing {
    credentials: Arc<dyn CredentialProvider>,
    selector: SignerSelector,
}

impl Signing {
    /// Sign with credentials from `credentials`, using the signer `selector`
    /// picks for each command.
    pub fn new(credentials: Arc<dyn CredentialProvider>, selector: SignerSelector) -> Self {
        Self {
            credentials,
            selector,
        }
    }

    /// Sign every command with the same signer.
    pub fn with_signer(credentials: Arc<dyn CredentialProvider>, signer: Arc<dyn Signer>) -> Self {
        Self::new(credentials, Arc::new(move |_: &Command| Arc::clone(&signer)))
    }

    fn sign(&self, command: &Command, request: Option<Request>) -> SdkResult<Request> {
        let request = request.ok_or_else(|| {
            SdkError::internal(format!(
                "{} reached signing before a request was built",
                command.name()
            ))
        })?;
        let credentials = self.credentials.credentials()?;
        let signer = (self.selector)(command);
        Ok(signer.sign(request, &credentials)?)
    }
}

impl std::fmt::Debug for Signing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signing").finish_non_exhaustive()
    }
}

impl Middleware for Signing {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        let this = self.clone();
        handler_fn(move |command: Command, request| match this.sign(&command, request) {
            Ok(signed) => next.call(command, Some(signed)),
            Err(err) => {
                debug!(operation = %command.name(), error = %err, "signing failed");
                reject(err)
            }
        })
    }
}
