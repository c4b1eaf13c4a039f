use std::sync::Arc;

use http::StatusCode;
use rustack_sdk_core::{MockHandler, Output, RetryConfig, SdkConfig, SdkError, ServiceError};
use serde_json::json;

use crate::notes_client;

fn throttled() -> SdkError {
    ServiceError::new(StatusCode::BAD_REQUEST, "ThrottlingException", "Rate exceeded").into()
}

fn config(max_attempts: u32) -> SdkConfig {
    SdkConfig::builder()
        .retry(RetryConfig::builder().max_attempts(max_attempts).build())
        .build()
}

#[tokio::test(start_paused = true)]
async fn test_should_retry_throttled_calls_until_success() {
    let mock = Arc::new(MockHandler::with_outcomes([
        Err(throttled()),
        Err(SdkError::transport("connection reset")),
        Ok(Output::new().with("Notes", json!([]))),
    ]));
    let client = notes_client(&mock, config(3)).unwrap();

    let output = client.call("ListNotes", json!({})).await.unwrap();

    assert_eq!(output.metadata().retries, 2);
    assert_eq!(mock.calls(), 3);
    assert_eq!(mock.remaining(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_should_give_up_after_max_attempts() {
    let mock = Arc::new(MockHandler::with_outcomes([
        Err(throttled()),
        Err(throttled()),
        Err(throttled()),
        Ok(Output::new()),
    ]));
    let client = notes_client(&mock, config(3)).unwrap();

    let err = client.call("ListNotes", json!({})).await.unwrap_err();

    assert_eq!(err.service_error().unwrap().code, "ThrottlingException");
    assert_eq!(err.attempts(), 3);
    assert_eq!(mock.calls(), 3);
    assert_eq!(mock.remaining(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_should_not_retry_client_errors() {
    let mock = Arc::new(MockHandler::with_outcomes([Err(ServiceError::new(
        StatusCode::BAD_REQUEST,
        "ValidationException",
        "Title is too long",
    )
    .into())]));
    let client = notes_client(&mock, config(5)).unwrap();

    let err = client.call("ListNotes", json!({})).await.unwrap_err();

    assert_eq!(err.attempts(), 1);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_should_reuse_signed_request_across_attempts() {
    let mock = Arc::new(MockHandler::with_outcomes([Err(throttled()), Ok(Output::new())]));
    let client = notes_client(&mock, config(2)).unwrap();

    client.call("ListNotes", json!({"Limit": 10})).await.unwrap();

    let history = client.history().unwrap();
    assert_eq!(history.len(), 1);
    let entry = history.last().unwrap();
    assert!(matches!(entry.outcome, Some(Ok(ref output)) if output.metadata().retries == 1));
    assert!(mock.last_request().unwrap().has_header("authorization"));
}
