//! The service client.
//!
//! A [`Client`] owns a resolved [`HandlerList`] assembled from the API model,
//! the credentials, the configuration and a transport. The default list is:
//!
//! | Step     | Entries                                       |
//! |----------|-----------------------------------------------|
//! | init     | `history`, `timer`, `source_file`             |
//! | validate | `validation`                                  |
//! | build    | `builder`, `content_type`, `invocation_id`    |
//! | sign     | `signer`, `retry`                             |
//!
//! `history` is present when the configured capacity is non-zero and
//! `validation` when parameter validation is enabled. Retry sits inside the
//! signer, so every attempt reuses the same signed request and invocation id.
//! SigV4 signatures expire 15 minutes after `x-amz-date`, so the whole retry
//! schedule has to fit in that window; [`RetryConfig`] caps each delay at
//! [`MAX_RETRY_DELAY_MS`] to keep the default schedule well inside it.
//!
//! The default serializer speaks the JSON protocol, which has no payload
//! member. Operations that stream a `Body` (including anything resolved from
//! `SourceFile`) fail with `Serialization` unless a payload-aware serializer
//! is installed with [`ClientBuilder::serializer`].
//!
//! [`RetryConfig`]: crate::config::RetryConfig
//! [`MAX_RETRY_DELAY_MS`]: crate::config::MAX_RETRY_DELAY_MS

use std::fmt;
use std::sync::Arc;

use http::Uri;
use rustack_sdk_auth::{CredentialProvider, EnvCredentialProvider};
use serde_json::Value;
use tracing::{debug, info};

use crate::body::Body;
use crate::command::Command;
use crate::config::SdkConfig;
use crate::error::{SdkError, SdkResult};
use crate::handler::SharedHandler;
use crate::handler_list::{HandlerList, Step};
use crate::history::{History, HistorySink};
use crate::middleware::{
    ContentType, HistoryRecorder, InvocationId, RequestBuilder, Retry, Serializer, SignerSelector,
    Signing, SourceFile, Timer, Validation,
};
use crate::model::{ParamValidator, ServiceModel, Validator};
use crate::output::Output;
use crate::protocol::JsonSerializer;
use crate::signer::{SignatureV4, Signer};

/// Executes commands against one service.
#[derive(Clone)]
pub struct Client {
    config: SdkConfig,
    model: Arc<ServiceModel>,
    list: HandlerList,
    handler: SharedHandler,
    history: Option<Arc<History>>,
}

impl Client {
    /// Start building a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a command for `name` from a JSON object of parameters.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownOperation` if the model does not define `name`.
    pub fn command(&self, name: &str, params: Value) -> SdkResult<Command> {
        if self.model.operation(name).is_none() {
            return Err(SdkError::unknown_operation(name));
        }
        Ok(Command::from_json(name, params))
    }

    /// Run a command through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns whatever error the pipeline settles with.
    pub async fn execute(&self, command: Command) -> SdkResult<Output> {
        debug!(operation = %command.name(), "executing command");
        self.handler.call(command, None).await
    }

    /// Create and run a command in one step.
    ///
    /// # Errors
    ///
    /// See [`Client::command`] and [`Client::execute`].
    pub async fn call(&self, name: &str, params: Value) -> SdkResult<Output> {
        let command = self.command(name, params)?;
        self.execute(command).await
    }

    /// Change the handler list and re-resolve the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or from resolving the changed list.
    pub fn customize(
        mut self,
        f: impl FnOnce(&mut HandlerList) -> SdkResult<()>,
    ) -> SdkResult<Self> {
        f(&mut self.list)?;
        self.handler = self.list.resolve()?;
        Ok(self)
    }

    /// The middleware currently installed.
    #[must_use]
    pub fn handler_list(&self) -> &HandlerList {
        &self.list
    }

    /// The client's history, when enabled.
    #[must_use]
    pub fn history(&self) -> Option<&Arc<History>> {
        self.history.as_ref()
    }

    /// The configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// The API model.
    #[must_use]
    pub fn model(&self) -> &Arc<ServiceModel> {
        &self.model
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("service", &self.model.metadata.service_id)
            .field("region", &self.config.region)
            .field("handlers", &self.list)
            .finish_non_exhaustive()
    }
}

/// Builds a [`Client`]. Only the model and the transport are required.
#[derive(Default)]
pub struct ClientBuilder {
    model: Option<Arc<ServiceModel>>,
    transport: Option<SharedHandler>,
    config: Option<SdkConfig>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    serializer: Option<Arc<dyn Serializer>>,
    signer: Option<SignerSelector>,
    validator: Option<Arc<dyn Validator>>,
    content_type_operations: Option<Vec<String>>,
}

impl ClientBuilder {
    /// The API model of the service.
    #[must_use]
    pub fn model(mut self, model: Arc<ServiceModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// The terminal handler that sends requests.
    #[must_use]
    pub fn transport(mut self, transport: SharedHandler) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Configuration; defaults to [`SdkConfig::default`].
    #[must_use]
    pub fn config(mut self, config: SdkConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Credentials; defaults to [`EnvCredentialProvider`].
    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Request serializer; defaults to [`JsonSerializer`].
    ///
    /// [`JsonSerializer`] rejects `Body` parameters, so services with payload
    /// operations need their own serializer here.
    #[must_use]
    pub fn serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Signer selection; defaults to SigV4, unsigned-payload for commands
    /// carrying a file-backed body.
    #[must_use]
    pub fn signer(mut self, selector: SignerSelector) -> Self {
        self.signer = Some(selector);
        self
    }

    /// Parameter validator; defaults to [`ParamValidator`].
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Operations whose `Content-Type` is inferred from the body's file name;
    /// defaults to every operation whose input declares `Body`.
    #[must_use]
    pub fn content_type_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_type_operations = Some(operations.into_iter().map(Into::into).collect());
        self
    }

    /// Assemble the handler list and resolve it.
    ///
    /// # Errors
    ///
    /// Fails if the model or transport is missing, or the endpoint is not a
    /// valid URI.
    pub fn build(self) -> SdkResult<Client> {
        let model = self
            .model
            .ok_or_else(|| SdkError::internal("client requires an API model"))?;
        let transport = self
            .transport
            .ok_or_else(|| SdkError::internal("client requires a transport"))?;
        let config = self.config.unwrap_or_default();
        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(EnvCredentialProvider));

        let serializer: Arc<dyn Serializer> = match self.serializer {
            Some(serializer) => serializer,
            None => {
                let endpoint = config.endpoint_for(&model.signing_name());
                let uri: Uri = endpoint
                    .parse()
                    .map_err(|err| SdkError::internal(format!("invalid endpoint {endpoint}: {err}")))?;
                Arc::new(JsonSerializer::new(Arc::clone(&model), uri))
            }
        };
        let selector = self
            .signer
            .unwrap_or_else(|| default_signer(&model.signing_name(), &config.region));
        let validator = self
            .validator
            .unwrap_or_else(|| Arc::new(ParamValidator::new()));
        let content_type_operations = self.content_type_operations.unwrap_or_else(|| {
            model
                .operation_names()
                .filter(|name| model.operation(name).is_some_and(|op| op.has_member("Body")))
                .map(str::to_owned)
                .collect()
        });

        let mut list = HandlerList::new();
        list.set_handler(transport);
        let history = (config.history_capacity > 0)
            .then(|| Arc::new(History::new(config.history_capacity)));
        if let Some(history) = &history {
            list.append(
                Step::Init,
                "history",
                Arc::new(HistoryRecorder::new(Arc::clone(history) as Arc<dyn HistorySink>)),
            );
        }
        list.append(Step::Init, "timer", Arc::new(Timer));
        list.append(Step::Init, "source_file", Arc::new(SourceFile::new(Arc::clone(&model))));
        if config.validate_params {
            list.append(
                Step::Validate,
                "validation",
                Arc::new(Validation::new(Arc::clone(&model), validator)),
            );
        }
        list.append(Step::Build, "builder", Arc::new(RequestBuilder::new(serializer)));
        list.append(
            Step::Build,
            "content_type",
            Arc::new(ContentType::new(content_type_operations)),
        );
        list.append(Step::Build, "invocation_id", Arc::new(InvocationId));
        list.append(Step::Sign, "signer", Arc::new(Signing::new(credentials, selector)));
        list.append(
            Step::Sign,
            "retry",
            Arc::new(Retry::new(config.retry.decider(), config.retry.delay())),
        );

        let handler = list.resolve()?;
        info!(
            service = %model.metadata.service_id,
            region = %config.region,
            handlers = ?list.names(),
            "client ready"
        );
        Ok(Client {
            config,
            model,
            list,
            handler,
            history,
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("model", &self.model.as_ref().map(|m| &m.metadata.service_id))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn default_signer(service: &str, region: &str) -> SignerSelector {
    let standard: Arc<dyn Signer> = Arc::new(SignatureV4::new(service, region));
    let streaming: Arc<dyn Signer> = Arc::new(SignatureV4::unsigned_payload(service, region));
    Arc::new(move |command: &Command| {
        let streams = command
            .iter()
            .any(|(_, param)| param.as_body().is_some_and(Body::is_streaming));
        if streams {
            Arc::clone(&streaming)
        } else {
            Arc::clone(&standard)
        }
    })
}
