//! End-to-end tests for the rustack SDK pipeline.
//!
//! Every test drives a real [`Client`] whose terminal handler is a
//! [`MockHandler`], so nothing leaves the process. Run them with:
//! ```text
//! cargo test -p rustack-sdk-integration
//! ```

use std::sync::{Arc, Once};

use http::{Method, Uri};
use rustack_sdk_auth::{Credentials, StaticCredentialProvider};
use rustack_sdk_core::middleware::Serializer;
use rustack_sdk_core::protocol::JsonSerializer;
use rustack_sdk_core::{
    Client, Command, MockHandler, Param, Request, SdkConfig, SdkError, SdkResult, ServiceModel,
    SharedHandler,
};

static INIT: Once = Once::new();

/// A small document service: JSON operations plus one payload upload.
pub const NOTES_MODEL: &str = r#"{
  "metadata": {
    "serviceId": "Notes",
    "signingName": "notes",
    "targetPrefix": "Notes_20240601",
    "jsonVersion": "1.0"
  },
  "operations": {
    "CreateNote": {"name": "CreateNote", "input": {"shape": "CreateNoteInput"}},
    "ListNotes": {"name": "ListNotes", "input": {"shape": "ListNotesInput"}},
    "UploadAttachment": {
      "name": "UploadAttachment",
      "http": {"method": "PUT", "requestUri": "/attachments/{NoteId}"},
      "input": {"shape": "UploadAttachmentInput"}
    }
  },
  "shapes": {
    "CreateNoteInput": {
      "type": "structure",
      "required": ["Title"],
      "members": {
        "Title": {"shape": "Title"},
        "Labels": {"shape": "LabelList"},
        "Priority": {"shape": "Priority"}
      }
    },
    "ListNotesInput": {
      "type": "structure",
      "members": {"Limit": {"shape": "Limit"}}
    },
    "UploadAttachmentInput": {
      "type": "structure",
      "required": ["NoteId", "Body"],
      "members": {
        "NoteId": {"shape": "Title"},
        "Body": {"shape": "Payload"}
      }
    },
    "LabelList": {"type": "list", "member": {"shape": "Label"}, "max": 3},
    "Label": {"type": "string", "pattern": "^[a-z-]+$"},
    "Title": {"type": "string", "min": 1, "max": 64},
    "Priority": {"type": "string", "enum": ["LOW", "HIGH"]},
    "Limit": {"type": "integer", "min": 1, "max": 100},
    "Payload": {"type": "blob"}
  }
}"#;

/// Endpoint every test client talks to.
pub const ENDPOINT: &str = "http://localhost:4566/";

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// The parsed notes model.
pub fn notes_model() -> anyhow::Result<Arc<ServiceModel>> {
    Ok(Arc::new(ServiceModel::from_json(NOTES_MODEL)?))
}

/// Serializes `UploadAttachment` as a raw `PUT` of its payload and every
/// other operation with the JSON protocol.
pub fn notes_serializer(model: Arc<ServiceModel>) -> Arc<dyn Serializer> {
    let json = JsonSerializer::new(model, Uri::from_static(ENDPOINT));
    Arc::new(move |command: &Command| -> SdkResult<Request> {
        if command.name() != "UploadAttachment" {
            return json.serialize(command);
        }
        let note = command
            .value("NoteId")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| SdkError::serialization("UploadAttachment", "NoteId is required"))?;
        let body = command
            .get("Body")
            .and_then(Param::as_body)
            .cloned()
            .ok_or_else(|| SdkError::serialization("UploadAttachment", "Body is required"))?;
        let uri: Uri = format!("{ENDPOINT}attachments/{note}")
            .parse()
            .map_err(|err| SdkError::serialization("UploadAttachment", format!("{err}")))?;
        Ok(Request::new(Method::PUT, uri).with_body(body))
    })
}

/// A notes client whose transport is `mock`.
pub fn notes_client(mock: &Arc<MockHandler>, config: SdkConfig) -> anyhow::Result<Client> {
    init_tracing();

    let model = notes_model()?;
    let client = Client::builder()
        .serializer(notes_serializer(Arc::clone(&model)))
        .model(model)
        .transport(Arc::clone(mock) as SharedHandler)
        .credentials(Arc::new(StaticCredentialProvider::new(Credentials::new(
            "test", "test",
        ))))
        .config(config)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod test_client;
#[cfg(test)]
mod test_pipeline;
#[cfg(test)]
mod test_retry;
