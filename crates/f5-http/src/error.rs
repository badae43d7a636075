// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for f5-http.

use serde_json::Value;
use thiserror::Error;

/// Result type using HttpError.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors produced by a single HTTP exchange.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The server answered with a 4xx or 5xx status.
    #[error("HTTP {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        /// Parsed error body, if the server sent one.
        body: Option<Value>,
    },

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request could not be built (bad URL, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Reading the response or writing a download failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    /// Status code for [`HttpError::Status`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Connection failures and 5xx responses may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Transport(_) => true,
            HttpError::Status { status, .. } => *status >= 500,
            HttpError::InvalidRequest(_) | HttpError::Io(_) => false,
        }
    }

    /// Best-effort human message from the error body.
    pub fn message(&self) -> String {
        match self {
            HttpError::Status { body: Some(body), reason, .. } => body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| reason.clone()),
            other => other.to_string(),
        }
    }
}
