// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Response normalization.

use serde_json::Value;

use crate::error::{HttpError, Result};

/// A successful (2xx) response with its body already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// `None` for 204 responses and zero-length bodies.
    pub body: Option<Value>,
}

impl HttpResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Borrow the body, `Value::Null` when empty.
    pub fn body(&self) -> &Value {
        self.body.as_ref().unwrap_or(&Value::Null)
    }

    pub fn into_body(self) -> Value {
        self.body.unwrap_or(Value::Null)
    }

    pub fn into_body_and_status(self) -> (Value, u16) {
        let status = self.status;
        (self.into_body(), status)
    }
}

/// Collapse a send result into an existence check.
///
/// Any 2xx is `true`, any 4xx/5xx is `false`; transport failures still
/// propagate so callers do not mistake an unreachable host for a missing
/// resource.
pub fn exists(result: Result<HttpResponse>) -> Result<bool> {
    match result {
        Ok(response) => Ok(response.is_success()),
        Err(HttpError::Status { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Parse raw response bytes.
///
/// Status 204, an explicit `Content-Length: 0` or a zero-length payload yield
/// `None`. JSON is parsed; anything else is returned as a JSON string.
pub fn parse_body(status: u16, content_length: Option<&str>, bytes: &[u8]) -> Option<Value> {
    if status == 204 || content_length.map(str::trim) == Some("0") || bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}
