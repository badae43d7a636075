// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scripted in-memory transport.
//!
//! Replies are queued per `(method, path)`. Each request pops the next reply;
//! the last queued reply is sticky and answers every further request to that
//! route. Requests to unscripted routes fail with a transport error. Every
//! request is recorded for later assertions.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;

use crate::error::{HttpError, Result};
use crate::request::{HttpRequest, Method};
use crate::response::HttpResponse;
use crate::transport::Transport;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A 2xx response.
    Ok { status: u16, body: Option<Value> },
    /// A 4xx/5xx response.
    Status {
        status: u16,
        reason: String,
        body: Option<Value>,
    },
    /// No response at all.
    Transport(String),
}

impl MockReply {
    pub fn json(status: u16, body: Value) -> Self {
        MockReply::Ok {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: u16) -> Self {
        MockReply::Ok { status, body: None }
    }

    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        MockReply::Status {
            status,
            reason: reason.into(),
            body: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        MockReply::Transport(message.into())
    }

    fn to_result(&self) -> Result<HttpResponse> {
        match self {
            MockReply::Ok { status, body } => Ok(HttpResponse::new(*status, body.clone())),
            MockReply::Status {
                status,
                reason,
                body,
            } => Err(HttpError::Status {
                status: *status,
                reason: reason.clone(),
                body: body.clone(),
            }),
            MockReply::Transport(message) => Err(HttpError::Transport(message.clone())),
        }
    }
}

#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    requests: Mutex<Vec<HttpRequest>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    downloads: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method path`.
    pub fn on(&self, method: Method, path: &str, reply: MockReply) -> &Self {
        lock(&self.routes)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue a 2xx JSON reply.
    pub fn reply_json(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.on(method, path, MockReply::json(status, body))
    }

    /// Serve `bytes` for downloads of `url`.
    pub fn serve_file(&self, url: &str, bytes: Vec<u8>) -> &Self {
        lock(&self.files).insert(url.to_string(), bytes);
        self
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Requests sent to `method path`.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
        lock(&self.requests)
            .iter()
            .filter(|request| request.method == method && request.path() == path)
            .cloned()
            .collect()
    }

    /// URLs passed to [`Transport::download`].
    pub fn downloads(&self) -> Vec<String> {
        lock(&self.downloads).clone()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        lock(&self.requests).push(request.clone());

        let key = (request.method, request.path());
        let mut routes = lock(&self.routes);
        let Some(queue) = routes.get_mut(&key) else {
            return Err(HttpError::Transport(format!(
                "no route for {} {}",
                key.0, key.1
            )));
        };

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match reply {
            Some(reply) => reply.to_result(),
            None => Err(HttpError::Transport(format!(
                "no reply left for {} {}",
                key.0, key.1
            ))),
        }
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        _timeout: Duration,
        _tls_verify: bool,
    ) -> Result<u64> {
        lock(&self.downloads).push(url.to_string());
        let files = lock(&self.files);
        let Some(bytes) = files.get(url) else {
            return Err(HttpError::Status {
                status: 404,
                reason: "Not Found".to_string(),
                body: None,
            });
        };
        std::fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_reply_is_sticky() {
        let mock = MockTransport::new();
        mock.reply_json(Method::Get, "/task", 200, json!({"status": "STARTED"}))
            .reply_json(Method::Get, "/task", 200, json!({"status": "FINISHED"}));

        let req = HttpRequest::new(Method::Get, "https://localhost:443/task");
        assert_eq!(mock.send(&req).unwrap().body()["status"], "STARTED");
        assert_eq!(mock.send(&req).unwrap().body()["status"], "FINISHED");
        assert_eq!(mock.send(&req).unwrap().body()["status"], "FINISHED");
        assert_eq!(mock.requests_to(Method::Get, "/task").len(), 3);
    }

    #[test]
    fn test_unrouted_request_is_transport_error() {
        let mock = MockTransport::new();
        let req = HttpRequest::new(Method::Post, "https://localhost:443/nowhere");
        assert!(matches!(mock.send(&req), Err(HttpError::Transport(_))));
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn test_status_reply() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/x", MockReply::status(401, "Unauthorized"));
        let req = HttpRequest::new(Method::Get, "https://localhost/x");
        assert_eq!(mock.send(&req).unwrap_err().status(), Some(401));
    }
}
