// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Task polling against a mocked device.

mod common;

use std::time::Duration;

use common::{TASK_ID, connect, mock_device, task_created, task_path};
use f5_http::Method;
use f5_http::mock::MockReply;
use f5_sdk::{RetryPolicy, SdkError, TaskPoller, TaskReference, TaskSignal};
use serde_json::json;

#[test]
fn test_accepted_status_code_is_polled_to_completion() {
    let mock = mock_device();
    let path = task_path(TASK_ID);
    mock.reply_json(Method::Get, &path, 200, json!({"status": "STARTED"}))
        .reply_json(Method::Get, &path, 200, json!({"status": "STARTED"}))
        .reply_json(Method::Get, &path, 200, json!({"status": "FINISHED", "result": 42}));
    let client = connect(&mock);

    let body = TaskPoller::with_defaults(client.session())
        .resolve(202, task_created(TASK_ID))
        .unwrap();

    assert_eq!(body["result"], 42);
    assert_eq!(mock.requests_to(Method::Get, &path).len(), 3);
}

#[test]
fn test_body_field_reference_is_polled() {
    let mock = mock_device();
    let path = "/mgmt/shared/appsvcs/task/4dc2d2f1";
    mock.reply_json(Method::Get, path, 200, json!({"results": [{"message": "in progress"}]}))
        .reply_json(Method::Get, path, 200, json!({"results": [{"message": "success"}]}));
    let client = connect(&mock);

    let initiating = json!({"id": "4dc2d2f1", "selfLink": "https://localhost/mgmt/shared/appsvcs/task/4dc2d2f1"});
    let reference = TaskReference::from_response(200, &initiating).unwrap().unwrap();
    assert_eq!(reference.signal, TaskSignal::AcceptedByBodyField);
    assert_eq!(reference.url, path);

    // A 200 without a status field is terminal on the first poll.
    let body = TaskPoller::with_defaults(client.session())
        .poll(&reference)
        .unwrap();
    assert_eq!(body["results"][0]["message"], "in progress");
    assert_eq!(mock.requests_to(Method::Get, path).len(), 1);
}

#[test]
fn test_completion_synonyms_are_success() {
    for status in ["FINISHED", "COMPLETED", "completed", "Finished"] {
        let mock = mock_device();
        let path = task_path(TASK_ID);
        mock.reply_json(Method::Get, &path, 200, json!({"status": "RUNNING"}))
            .reply_json(Method::Get, &path, 200, json!({"status": status}));
        let client = connect(&mock);

        let body = TaskPoller::with_defaults(client.session())
            .resolve(202, task_created(TASK_ID))
            .unwrap();
        assert_eq!(body["status"], status);
    }
}

#[test]
fn test_failure_carries_server_message() {
    let mock = mock_device();
    let path = task_path(TASK_ID);
    mock.reply_json(
        Method::Get,
        &path,
        200,
        json!({"status": "FAILED", "errorMessage": "Package f5-appsvcs-3.9.0-3.noarch is already installed"}),
    );
    let client = connect(&mock);

    let err = TaskPoller::with_defaults(client.session())
        .resolve(202, task_created(TASK_ID))
        .unwrap_err();

    match err {
        SdkError::TaskFailed { url, message } => {
            assert_eq!(url, format!("{}?ver=15.1.0", path));
            assert!(message.contains("already installed"));
        }
        other => panic!("expected TaskFailed, got {:?}", other),
    }
    assert_eq!(mock.requests_to(Method::Get, &path).len(), 1);
}

#[test]
fn test_nested_result_status_failure() {
    let mock = mock_device();
    let path = "/mgmt/shared/declarative-onboarding/task/77";
    mock.reply_json(
        Method::Get,
        path,
        200,
        json!({"result": {"status": "FAILED", "message": "invalid config"}}),
    );
    let client = connect(&mock);

    let initiating = json!({"selfLink": format!("https://localhost{}", path)});
    let err = TaskPoller::with_defaults(client.session())
        .resolve(200, initiating)
        .unwrap_err();
    assert!(matches!(err, SdkError::TaskFailed { ref message, .. } if message == "invalid config"));
}

#[test]
fn test_timeout_is_distinct_from_failure() {
    let mock = mock_device();
    let path = task_path(TASK_ID);
    mock.reply_json(Method::Get, &path, 200, json!({"status": "STARTED"}));
    let client = connect(&mock);

    let poller = TaskPoller::new(client.session(), RetryPolicy::new(4, Duration::ZERO));
    let err = poller.resolve(202, task_created(TASK_ID)).unwrap_err();

    assert!(matches!(err, SdkError::TaskTimeout { attempts: 4, .. }));
    assert_eq!(mock.requests_to(Method::Get, &path).len(), 4);
}

#[test]
fn test_transient_poll_error_consumes_attempt() {
    let mock = mock_device();
    let path = task_path(TASK_ID);
    mock.on(Method::Get, &path, MockReply::transport("connection reset"))
        .reply_json(Method::Get, &path, 200, json!({"status": "FINISHED"}));
    let client = connect(&mock);

    let body = TaskPoller::with_defaults(client.session())
        .resolve(202, task_created(TASK_ID))
        .unwrap();
    assert_eq!(body["status"], "FINISHED");
    assert_eq!(mock.requests_to(Method::Get, &path).len(), 2);
}

#[test]
fn test_immediate_success_is_not_polled() {
    let mock = mock_device();
    let client = connect(&mock);
    let before = mock.requests().len();

    let body = json!({
        "name": "vs_web",
        "selfLink": "https://localhost/mgmt/tm/ltm/virtual/~Common~vs_web?ver=15.1.0"
    });
    let result = TaskPoller::with_defaults(client.session())
        .resolve(200, body.clone())
        .unwrap();

    assert_eq!(result, body);
    assert_eq!(mock.requests().len(), before);
}

#[test]
fn test_accepted_without_reference_is_unexpected() {
    let mock = mock_device();
    let client = connect(&mock);

    let err = TaskPoller::with_defaults(client.session())
        .resolve(202, json!({"message": "accepted"}))
        .unwrap_err();
    assert!(matches!(err, SdkError::UnexpectedResponse(_)));
}
