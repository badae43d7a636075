// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for f5-sdk integration tests.
//!
//! Provides a mocked BIG-IP that accepts logins and a config with zero-delay
//! retry budgets and the bundled catalog.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use f5_http::Method;
use f5_http::mock::MockTransport;
use f5_sdk::auth::{BIGIP_LOGIN_URI, BIGIP_TOKENS_URI};
use f5_sdk::extension::package::PACKAGE_TASKS_URI;
use f5_sdk::{CatalogSource, ClientConfig, Credentials, Logger, ManagementClient, RetryPolicy};
use serde_json::{Value, json};

pub const TOKEN: &str = "test-token";
pub const TASK_ID: &str = "0f7c6a2e";

pub fn test_config() -> ClientConfig {
    ClientConfig::new("192.0.2.10")
        .with_catalog(CatalogSource::Bundled)
        .with_auth_retry(RetryPolicy::new(3, Duration::ZERO))
        .with_task_retry(RetryPolicy::new(5, Duration::ZERO))
        .with_ready_retry(RetryPolicy::new(5, Duration::ZERO))
}

/// A device that accepts any credentials.
pub fn mock_device() -> Arc<MockTransport> {
    let mock = Arc::new(MockTransport::new());
    mock.reply_json(
        Method::Post,
        BIGIP_LOGIN_URI,
        200,
        json!({"token": {"token": TOKEN, "timeout": 1200}}),
    )
    .reply_json(
        Method::Patch,
        &format!("{}/{}", BIGIP_TOKENS_URI, TOKEN),
        200,
        json!({"token": TOKEN, "timeout": 3600}),
    );
    mock
}

pub fn connect(mock: &Arc<MockTransport>) -> ManagementClient {
    connect_with(mock, test_config())
}

pub fn connect_with(mock: &Arc<MockTransport>, config: ClientConfig) -> ManagementClient {
    ManagementClient::with_transport(config, Credentials::new("admin", "admin"), mock.clone())
        .expect("mock login succeeds")
}

pub fn task_path(id: &str) -> String {
    format!("{}/{}", PACKAGE_TASKS_URI, id)
}

/// `202` initiating response pointing at package task `id`.
pub fn task_created(id: &str) -> Value {
    json!({
        "id": id,
        "status": "CREATED",
        "selfLink": format!("https://localhost{}?ver=15.1.0", task_path(id)),
    })
}

/// Finished package task, optionally with a query listing.
pub fn task_finished(packages: &[&str]) -> Value {
    let listing: Vec<Value> = packages
        .iter()
        .map(|name| json!({"name": name, "packageName": name}))
        .collect();
    json!({"id": TASK_ID, "status": "FINISHED", "queryResponse": listing})
}

/// In-memory log sink.
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Buffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Logger writing plain fmt output into the returned buffer.
pub fn buffered_logger() -> (Logger, Buffer) {
    let buffer = Buffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    (Logger::from_dispatch(tracing::Dispatch::new(subscriber)), buffer)
}
