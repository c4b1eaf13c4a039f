use std::sync::Arc;

use parking_lot::Mutex;
use rustack_sdk_core::middleware::{Tap, map_command, map_result};
use rustack_sdk_core::{MockHandler, Output, SdkConfig, SdkError, Step};
use serde_json::json;

use crate::notes_client;

#[tokio::test]
async fn test_should_expose_requests_only_inside_the_builder() {
    let mock = Arc::new(MockHandler::new());
    mock.push_ok(Output::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (outer, inner) = (Arc::clone(&seen), Arc::clone(&seen));

    let client = notes_client(&mock, SdkConfig::default())
        .unwrap()
        .customize(|list| {
            list.before(
                "builder",
                "tap_outer",
                Arc::new(Tap::new(move |_command, request| {
                    outer.lock().push(("outer", request.is_some()));
                })),
            )?;
            list.after(
                "builder",
                "tap_inner",
                Arc::new(Tap::new(move |_command, request| {
                    inner.lock().push(("inner", request.is_some()));
                })),
            )
        })
        .unwrap();

    client.call("ListNotes", json!({})).await.unwrap();
    assert_eq!(*seen.lock(), [("outer", false), ("inner", true)]);
}

#[tokio::test]
async fn test_should_run_init_middleware_before_validation() {
    let mock = Arc::new(MockHandler::new());
    mock.push_ok(Output::new());

    let client = notes_client(&mock, SdkConfig::default())
        .unwrap()
        .customize(|list| {
            list.prepend(
                Step::Init,
                "default_title",
                map_command(|mut command| {
                    if !command.contains("Title") {
                        command.set("Title", "untitled");
                    }
                    command
                }),
            );
            Ok(())
        })
        .unwrap();

    client.call("CreateNote", json!({})).await.unwrap();
    let command = mock.last_command().unwrap();
    assert_eq!(command.value("Title"), Some(&json!("untitled")));
}

#[tokio::test]
async fn test_should_map_results_on_the_way_out() {
    let mock = Arc::new(MockHandler::new());
    mock.push_ok(Output::new().with("Count", 2));

    let client = notes_client(&mock, SdkConfig::default())
        .unwrap()
        .customize(|list| {
            list.append(
                Step::Init,
                "annotate",
                map_result(|output| output.with("Annotated", true)),
            );
            Ok(())
        })
        .unwrap();

    let output = client.call("ListNotes", json!({})).await.unwrap();
    assert_eq!(output.get("Count"), Some(&json!(2)));
    assert_eq!(output.get("Annotated"), Some(&json!(true)));
}

#[tokio::test]
async fn test_should_survive_panicking_tap() {
    let mock = Arc::new(MockHandler::new());
    mock.push_ok(Output::new());

    let client = notes_client(&mock, SdkConfig::default())
        .unwrap()
        .customize(|list| {
            list.append(
                Step::Validate,
                "noisy",
                Arc::new(Tap::new(|_command, _request| panic!("tap exploded"))),
            );
            Ok(())
        })
        .unwrap();

    assert!(client.call("ListNotes", json!({})).await.is_ok());
}

#[tokio::test]
async fn test_should_evict_oldest_history_entries() {
    let mock = Arc::new(MockHandler::with_outcomes([
        Ok(Output::new()),
        Err(SdkError::transport("down")),
        Ok(Output::new()),
    ]));
    let config = SdkConfig::builder()
        .history_capacity(2)
        .retry(rustack_sdk_core::RetryConfig::builder().max_attempts(1).build())
        .build();
    let client = notes_client(&mock, config).unwrap();

    for limit in [1, 2, 3] {
        let _ = client.call("ListNotes", json!({"Limit": limit})).await;
    }

    let entries = client.history().unwrap().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].command.value("Limit"), Some(&json!(2)));
    assert!(matches!(entries[0].outcome, Some(Err(_))));
    assert!(matches!(entries[1].outcome, Some(Ok(_))));
    assert!(entries[0].ticket < entries[1].ticket);
}

#[tokio::test]
async fn test_should_reject_insertion_next_to_unknown_entry() {
    let mock = Arc::new(MockHandler::new());
    let client = notes_client(&mock, SdkConfig::default()).unwrap();

    let err = client
        .customize(|list| list.before("missing", "nope", map_result(|output| output)))
        .unwrap_err();
    assert!(err.to_string().contains("missing"));
}
