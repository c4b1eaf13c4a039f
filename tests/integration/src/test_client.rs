use std::io::Write;
use std::sync::Arc;

use rustack_sdk_core::{ErrorKind, MockHandler, Output, Rule, SdkConfig};
use serde_json::{Value, json};

use crate::notes_client;

#[tokio::test]
async fn test_should_send_signed_json_command() {
    let mock = Arc::new(MockHandler::new());
    mock.push_ok(Output::new().with("NoteId", "n-1"));
    let client = notes_client(&mock, SdkConfig::default()).unwrap();

    let output = client
        .call("CreateNote", json!({"Title": "groceries", "Labels": ["home"]}))
        .await
        .unwrap();
    assert_eq!(output.get("NoteId"), Some(&json!("n-1")));

    let request = mock.last_request().unwrap();
    assert_eq!(request.uri().to_string(), crate::ENDPOINT);
    assert_eq!(request.header("x-amz-target"), Some("Notes_20240601.CreateNote"));
    assert_eq!(request.content_type(), Some("application/x-amz-json-1.0"));
    assert!(
        request
            .header("authorization")
            .unwrap()
            .starts_with("AWS4-HMAC-SHA256 Credential=test/")
    );
    assert!(request.has_header("amz-sdk-invocation-id"));

    let body: Value = serde_json::from_slice(&request.body().collect().await.unwrap()).unwrap();
    assert_eq!(body, json!({"Title": "groceries", "Labels": ["home"]}));
}

#[tokio::test]
async fn test_should_reject_invalid_params_before_sending() {
    let mock = Arc::new(MockHandler::new());
    let client = notes_client(&mock, SdkConfig::default()).unwrap();

    let err = client
        .call(
            "CreateNote",
            json!({"Labels": ["ok", "Not OK"], "Priority": "URGENT"}),
        )
        .await
        .unwrap_err();

    let validation = err.validation_error().unwrap();
    assert_eq!(validation.operation, "CreateNote");
    let paths: Vec<_> = validation.violations.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(paths, ["Title", "Labels[1]", "Priority"]);
    assert_eq!(validation.violations[0].rule, Rule::Required);
    assert_eq!(mock.calls(), 0);

    let entry = client.history().unwrap().last().unwrap();
    assert!(entry.is_finished());
    assert!(entry.request.is_none());
}

#[tokio::test]
async fn test_should_skip_validation_when_disabled() {
    let mock = Arc::new(MockHandler::new());
    mock.push_ok(Output::new());
    let config = SdkConfig::builder().validate_params(false).build();
    let client = notes_client(&mock, config).unwrap();

    client.call("ListNotes", json!({"Limit": 0})).await.unwrap();
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_should_reject_unknown_operation() {
    let mock = Arc::new(MockHandler::new());
    let client = notes_client(&mock, SdkConfig::default()).unwrap();

    let err = client.call("DeleteEverything", json!({})).await.unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnknownOperation(name) if name == "DeleteEverything"));
    assert_eq!(err.to_string(), "Operation not found: DeleteEverything");
}

#[tokio::test]
async fn test_should_upload_attachment_from_source_file() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"remember the milk").unwrap();
    let path = file.path().to_str().unwrap().to_owned();

    let mock = Arc::new(MockHandler::new());
    mock.push_ok(Output::new());
    let client = notes_client(&mock, SdkConfig::default()).unwrap();

    client
        .call("UploadAttachment", json!({"NoteId": "n-1", "SourceFile": path}))
        .await
        .unwrap();

    let command = mock.last_command().unwrap();
    assert!(!command.contains("SourceFile"));
    assert!(command.get("Body").unwrap().as_body().unwrap().is_streaming());

    let request = mock.last_request().unwrap();
    assert_eq!(request.method(), &http::Method::PUT);
    assert_eq!(request.uri().path(), "/attachments/n-1");
    assert_eq!(request.content_type(), Some("text/plain"));
    assert_eq!(request.header("x-amz-content-sha256"), Some("UNSIGNED-PAYLOAD"));
    assert_eq!(&request.body().collect().await.unwrap()[..], b"remember the milk");
}

#[tokio::test]
async fn test_should_infer_image_content_type() {
    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(b"\x89PNG").unwrap();
    let path = file.path().to_str().unwrap().to_owned();

    let mock = Arc::new(MockHandler::new());
    mock.push_ok(Output::new());
    let client = notes_client(&mock, SdkConfig::default()).unwrap();

    client
        .call("UploadAttachment", json!({"NoteId": "n-2", "SourceFile": path}))
        .await
        .unwrap();
    assert_eq!(mock.last_request().unwrap().content_type(), Some("image/png"));
}
