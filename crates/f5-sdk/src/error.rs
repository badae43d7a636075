// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for f5-sdk.

use f5_http::HttpError;
use thiserror::Error;

/// Result type using SdkError.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors that can occur when using the SDK.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// An authenticated request was attempted before a token was acquired.
    #[error("authentication required: no token on this session")]
    AuthenticationRequired,

    /// The device rejected the credentials outright.
    #[error("invalid credentials (HTTP {status}): {message}")]
    InvalidCredentials { status: u16, message: String },

    /// Transport failure or non-2xx response.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The server reported the task as failed.
    #[error("task {url} failed: {message}")]
    TaskFailed { url: String, message: String },

    /// The task never reached a terminal state within the attempt budget.
    #[error("task {url} did not complete after {attempts} attempts")]
    TaskTimeout { url: String, attempts: u32 },

    /// A non-task wait (device readiness, service availability) ran out of attempts.
    #[error("timed out waiting for {operation} after {attempts} attempts")]
    Timeout { operation: String, attempts: u32 },

    /// Component is not present in the catalog.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// Version is not present in the catalog for this component.
    #[error("unknown version {version} for component {component}")]
    UnknownVersion { component: String, version: String },

    /// Package source override failed validation.
    #[error("invalid package source: {0}")]
    InvalidSource(String),

    /// The catalog declares no such endpoint for this component.
    #[error("component {component} has no {endpoint} endpoint")]
    UnsupportedEndpoint { component: String, endpoint: String },

    /// The install task finished but the package did not show up afterwards.
    #[error("{component} {version} not found on device after install")]
    VerificationFailed { component: String, version: String },

    /// Invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Local filesystem error (staging, reading artifacts).
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Unexpected response from server.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl SdkError {
    /// Whether a retry policy should spend another attempt on this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            SdkError::Http(err) => err.is_transient(),
            _ => false,
        }
    }

    /// HTTP status code when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Http(err) => err.status(),
            SdkError::InvalidCredentials { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        SdkError::Io(err.to_string())
    }
}

impl From<url::ParseError> for SdkError {
    fn from(err: url::ParseError) -> Self {
        SdkError::InvalidInput(err.to_string())
    }
}
