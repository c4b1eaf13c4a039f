//! The AWS JSON protocol (`awsJson1_0` / `awsJson1_1`).
//!
//! Every operation is a `POST /` whose `X-Amz-Target` header names the
//! operation as `{targetPrefix}.{Operation}` and whose body is the JSON object
//! of the input members. Errors come back as a JSON body whose `__type` holds
//! the error code (possibly namespaced with `#`) and whose `message` (or
//! `Message`) holds the description; some services put the code in the
//! `x-amzn-errortype` header instead.

use std::sync::Arc;

use http::header::{CONTENT_TYPE, HeaderName};
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use serde_json::{Map, Value};
use tracing::debug;

use crate::command::{Command, Param};
use crate::error::{SdkError, SdkResult, ServiceError};
use crate::middleware::Serializer;
use crate::model::ServiceModel;
use crate::output::{Metadata, Output};
use crate::request::Request;

/// Header naming the target operation.
pub const X_AMZ_TARGET: &str = "x-amz-target";

const REQUEST_ID_HEADERS: [&str; 2] = ["x-amzn-requestid", "x-amz-request-id"];
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Serializes commands for a JSON-protocol service.
#[derive(Debug, Clone)]
pub struct JsonSerializer {
    model: Arc<ServiceModel>,
    endpoint: Uri,
}

impl JsonSerializer {
    /// Serialize for `model`, sending to `endpoint`.
    #[must_use]
    pub fn new(model: Arc<ServiceModel>, endpoint: Uri) -> Self {
        Self { model, endpoint }
    }

    /// `application/x-amz-json-1.0` or `-1.1`, per the model.
    #[must_use]
    pub fn content_type(&self) -> String {
        let version = self.model.metadata.json_version.as_deref().unwrap_or("1.0");
        format!("application/x-amz-json-{version}")
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, command: &Command) -> SdkResult<Request> {
        let operation = command.name();
        if self.model.operation(operation).is_none() {
            return Err(SdkError::unknown_operation(operation));
        }
        let prefix = self
            .model
            .metadata
            .target_prefix
            .as_deref()
            .ok_or_else(|| SdkError::serialization(operation, "the model declares no target prefix"))?;

        let mut members = Map::new();
        for (name, param) in command.iter() {
            match param {
                Param::Value(Value::Null) => {}
                Param::Value(value) => {
                    members.insert(name.to_owned(), value.clone());
                }
                Param::Body(_) => {
                    return Err(SdkError::serialization(
                        operation,
                        format!("{name} is a payload, which the JSON protocol cannot carry"),
                    ));
                }
            }
        }
        let payload = serde_json::to_vec(&Value::Object(members))
            .map_err(|err| SdkError::serialization(operation, err.to_string()))?;

        let header = |value: String| {
            HeaderValue::from_str(&value)
                .map_err(|err| SdkError::serialization(operation, err.to_string()))
        };
        Ok(Request::new(Method::POST, self.endpoint.clone())
            .with_header(CONTENT_TYPE, header(self.content_type())?)
            .with_header(
                HeaderName::from_static(X_AMZ_TARGET),
                header(format!("{prefix}.{operation}"))?,
            )
            .with_body(payload))
    }
}

/// Turn a JSON-protocol response into an output or a service error.
///
/// # Errors
///
/// Returns [`ErrorKind::Service`](crate::error::ErrorKind::Service) for
/// non-2xx responses and a serialization error when a 2xx body is not JSON.
pub fn parse_json_response(
    operation: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> SdkResult<Output> {
    let request_id = REQUEST_ID_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if status.is_success() {
        let value = if body.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body)
                .map_err(|err| SdkError::serialization(operation, format!("invalid response body: {err}")))?
        };
        let metadata = Metadata {
            status: Some(status),
            headers: headers.clone(),
            request_id,
            ..Metadata::default()
        };
        return Ok(Output::from_json(value).with_metadata(metadata));
    }

    let document: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let code = headers
        .get(ERROR_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| document.get("__type").and_then(Value::as_str))
        .or_else(|| document.get("code").and_then(Value::as_str))
        .map_or_else(|| fallback_code(status), sanitize_error_code);
    let message = document
        .get("message")
        .or_else(|| document.get("Message"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    debug!(operation, %status, code = %code, "service returned an error");
    let mut error = ServiceError::new(status, code, message);
    if let Some(id) = request_id {
        error = error.with_request_id(id);
    }
    Err(error.into())
}

/// Strip the namespace (`ns#Code`) and the trailing URI (`Code:http://...`)
/// from an error code.
fn sanitize_error_code(raw: &str) -> String {
    let code = raw.split(':').next().unwrap_or(raw);
    code.rsplit('#').next().unwrap_or(code).to_owned()
}

fn fallback_code(status: StatusCode) -> String {
    if status.is_server_error() {
        "InternalFailure".to_owned()
    } else {
        "UnknownError".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::body::Body;
    use crate::model::fixtures::storage_model;

    fn serializer() -> JsonSerializer {
        JsonSerializer::new(
            Arc::new(storage_model()),
            Uri::from_static("https://storage.us-east-1.amazonaws.com/"),
        )
    }

    #[tokio::test]
    async fn test_should_serialize_json_request() {
        let command = Command::new("ListObjects")
            .param("Bucket", "photos")
            .param("MaxKeys", json!(10))
            .param("Fetch", Value::Null);
        let request = serializer().serialize(&command).unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.header("x-amz-target"), Some("Storage_20240101.ListObjects"));
        assert_eq!(request.content_type(), Some("application/x-amz-json-1.1"));
        let body: Value = serde_json::from_slice(&request.body().collect().await.unwrap()).unwrap();
        assert_eq!(body, json!({"Bucket": "photos", "MaxKeys": 10}));
    }

    #[test]
    fn test_should_refuse_payload_params() {
        let command = Command::new("PutObject").param("Body", Body::from_path("a.bin"));
        let err = serializer().serialize(&command).unwrap_err();
        assert!(err.to_string().contains("Body is a payload"));

        let err = serializer().serialize(&Command::new("Nope")).unwrap_err();
        assert!(err.to_string().contains("Operation not found: Nope"));
    }

    #[test]
    fn test_should_parse_success_response() {
        let mut headers = HeaderMap::new();
        headers.insert("x-amzn-requestid", HeaderValue::from_static("req-1"));
        let output = parse_json_response(
            "ListObjects",
            StatusCode::OK,
            &headers,
            br#"{"Contents": [], "IsTruncated": false}"#,
        )
        .unwrap();

        assert_eq!(output.get("IsTruncated"), Some(&json!(false)));
        assert_eq!(output.metadata().request_id.as_deref(), Some("req-1"));
        assert_eq!(output.metadata().status, Some(StatusCode::OK));

        let empty = parse_json_response("Ping", StatusCode::OK, &HeaderMap::new(), b"").unwrap();
        assert!(empty.data().is_empty());
    }

    #[test]
    fn test_should_parse_namespaced_error_type() {
        let err = parse_json_response(
            "GetItem",
            StatusCode::BAD_REQUEST,
            &HeaderMap::new(),
            br#"{"__type": "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException", "message": "Requested resource not found"}"#,
        )
        .unwrap_err();

        let service = err.service_error().unwrap();
        assert_eq!(service.code, "ResourceNotFoundException");
        assert_eq!(service.message, "Requested resource not found");
        assert_eq!(service.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_should_prefer_error_type_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            ERROR_TYPE_HEADER,
            HeaderValue::from_static("ThrottlingException:http://internal.amazon.com/coral/"),
        );
        headers.insert("x-amz-request-id", HeaderValue::from_static("req-2"));
        let err = parse_json_response(
            "GetItem",
            StatusCode::BAD_REQUEST,
            &headers,
            br#"{"Message": "Rate exceeded"}"#,
        )
        .unwrap_err();

        let service = err.service_error().unwrap();
        assert_eq!(service.code, "ThrottlingException");
        assert_eq!(service.message, "Rate exceeded");
        assert_eq!(service.request_id.as_deref(), Some("req-2"));
    }

    #[test]
    fn test_should_fall_back_for_unparseable_errors() {
        let err = parse_json_response("GetItem", StatusCode::BAD_GATEWAY, &HeaderMap::new(), b"<html>")
            .unwrap_err();
        assert_eq!(err.service_error().unwrap().code, "InternalFailure");

        let err = parse_json_response("GetItem", StatusCode::OK, &HeaderMap::new(), b"<html>")
            .unwrap_err();
        assert!(err.service_error().is_none());
    }
}
