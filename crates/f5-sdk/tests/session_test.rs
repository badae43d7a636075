// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Session establishment and authenticated requests through ManagementClient.

mod common;

use std::sync::Arc;

use common::{TOKEN, connect, mock_device, test_config};
use f5_http::Method;
use f5_http::mock::{MockReply, MockTransport};
use f5_sdk::auth::{BIGIP_AUTH_HEADER, BIGIP_LOGIN_URI, BIGIP_TOKENS_URI};
use f5_sdk::{Credentials, ManagementClient, RequestOptions, SdkError};
use serde_json::json;

#[test]
fn test_login_extends_token_timeout() {
    let mock = mock_device();
    let client = connect(&mock);

    assert!(client.session().session().is_authenticated());

    let login = &mock.requests_to(Method::Post, BIGIP_LOGIN_URI)[0];
    assert_eq!(login.body, f5_http::Body::Json(json!({
        "username": "admin",
        "password": "admin",
        "loginProviderName": "tmos",
    })));

    let extend = &mock.requests_to(Method::Patch, &format!("{}/{}", BIGIP_TOKENS_URI, TOKEN))[0];
    assert_eq!(extend.header_value(BIGIP_AUTH_HEADER), Some(TOKEN));
    assert_eq!(extend.body, f5_http::Body::Json(json!({"timeout": 3600})));
}

#[test]
fn test_rejected_credentials_fail_without_retry() {
    let mock = Arc::new(MockTransport::new());
    mock.on(
        Method::Post,
        BIGIP_LOGIN_URI,
        MockReply::Status {
            status: 401,
            reason: "Unauthorized".to_string(),
            body: Some(json!({"code": 401, "message": "Authentication failed."})),
        },
    );

    let err = ManagementClient::with_transport(
        test_config(),
        Credentials::new("admin", "wrong"),
        mock.clone(),
    )
    .unwrap_err();

    match err {
        SdkError::InvalidCredentials { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Authentication failed.");
        }
        other => panic!("expected InvalidCredentials, got {:?}", other),
    }
    assert_eq!(mock.requests_to(Method::Post, BIGIP_LOGIN_URI).len(), 1);
}

#[test]
fn test_unreachable_device_exhausts_auth_budget() {
    let mock = Arc::new(MockTransport::new());
    mock.on(
        Method::Post,
        BIGIP_LOGIN_URI,
        MockReply::transport("connection refused"),
    );

    let err = ManagementClient::with_transport(
        test_config(),
        Credentials::new("admin", "admin"),
        mock.clone(),
    )
    .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(mock.requests_to(Method::Post, BIGIP_LOGIN_URI).len(), 3);
}

#[test]
fn test_make_request_injects_token() {
    let mock = mock_device();
    mock.reply_json(
        Method::Get,
        "/mgmt/tm/sys/version",
        200,
        json!({"kind": "tm:sys:version:versionstats"}),
    );
    let client = connect(&mock);

    let body = client
        .make_request("/mgmt/tm/sys/version", RequestOptions::get())
        .unwrap();
    assert_eq!(body["kind"], "tm:sys:version:versionstats");

    let sent = &mock.requests_to(Method::Get, "/mgmt/tm/sys/version")[0];
    assert_eq!(sent.header_value(BIGIP_AUTH_HEADER), Some(TOKEN));
    assert!(sent.url.starts_with("https://192.0.2.10:443/"));
    assert!(!sent.tls_verify);
}

#[test]
fn test_make_request_with_status_and_query() {
    let mock = mock_device();
    mock.reply_json(Method::Post, "/mgmt/shared/appsvcs/declare", 202, json!({"id": "abc"}));
    let client = connect(&mock);

    let (body, status) = client
        .make_request_with_status(
            "/mgmt/shared/appsvcs/declare",
            RequestOptions::post(json!({"class": "AS3"})).with_query("async", "true"),
        )
        .unwrap();
    assert_eq!(status, 202);
    assert_eq!(body["id"], "abc");

    let sent = &mock.requests_to(Method::Post, "/mgmt/shared/appsvcs/declare")[0];
    assert!(sent.url.ends_with("/mgmt/shared/appsvcs/declare?async=true"));
}

#[test]
fn test_error_status_surfaces_server_message() {
    let mock = mock_device();
    mock.on(
        Method::Get,
        "/mgmt/tm/ltm/virtual/missing",
        MockReply::Status {
            status: 404,
            reason: "Not Found".to_string(),
            body: Some(json!({"code": 404, "message": "Object not found"})),
        },
    );
    let client = connect(&mock);

    let err = client
        .make_request("/mgmt/tm/ltm/virtual/missing", RequestOptions::get())
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("404"));
}
