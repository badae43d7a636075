// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the management clients.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SdkError};
use crate::logging::Logger;
use crate::retry::RetryPolicy;

/// Default HTTPS port of the management interface.
pub const DEFAULT_PORT: u16 = 443;

/// Cloud Services API host.
pub const CLOUD_SERVICES_HOST: &str = "api.cloudservices.f5.com";

/// Published extension metadata document.
pub const DEFAULT_CATALOG_URL: &str =
    "https://cdn.f5.com/product/cloudsolutions/f5-extension-metadata/latest/metadata.json";

/// Username/password pair exchanged for a token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `F5_SDK_USERNAME` and `F5_SDK_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let username = lookup("F5_SDK_USERNAME")
            .ok_or_else(|| SdkError::Config("F5_SDK_USERNAME is not set".to_string()))?;
        let password = lookup("F5_SDK_PASSWORD")
            .ok_or_else(|| SdkError::Config("F5_SDK_PASSWORD is not set".to_string()))?;
        Ok(Self::new(username, password))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the component catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Only the document compiled into the crate.
    Bundled,
    /// Fetch from this URL, falling back to the bundled document on any failure.
    Remote(String),
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::Remote(DEFAULT_CATALOG_URL.to_string())
    }
}

/// Configuration shared by the BIG-IP and Cloud Services clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Management host name or address.
    pub host: String,
    /// Management port.
    pub port: u16,
    /// Verify the device's TLS certificate.
    pub tls_verify: bool,
    /// Timeout applied to each HTTP request.
    pub request_timeout: Duration,
    /// Budget for token acquisition.
    pub auth_retry: RetryPolicy,
    /// Budget for polling an accepted task.
    pub task_retry: RetryPolicy,
    /// Budget for device readiness and service availability waits.
    pub ready_retry: RetryPolicy,
    /// Token lifetime requested from the device after login.
    pub token_timeout: Duration,
    /// Component catalog source.
    pub catalog: CatalogSource,
    /// Directory for downloaded artifacts (default: system temp dir).
    pub staging_dir: Option<PathBuf>,
    /// Sink for this client's log events.
    pub logger: Logger,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            tls_verify: false,
            request_timeout: Duration::from_secs(60),
            auth_retry: RetryPolicy::default(),
            task_retry: RetryPolicy::default(),
            ready_retry: RetryPolicy::long(),
            token_timeout: Duration::from_secs(3600),
            catalog: CatalogSource::default(),
            staging_dir: None,
            logger: Logger::default(),
        }
    }
}

impl ClientConfig {
    /// Configuration for a device at `host` with default values.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Configuration for the Cloud Services API.
    pub fn cloud_services() -> Self {
        Self {
            tls_verify: true,
            ..Self::new(CLOUD_SERVICES_HOST)
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `F5_SDK_HOST`: management host (required)
    /// - `F5_SDK_PORT`: management port (default: 443)
    /// - `F5_SDK_TLS_VERIFY`: verify certificates (default: "false")
    /// - `F5_SDK_REQUEST_TIMEOUT_MS`: per-request timeout (default: 60000)
    /// - `F5_SDK_TASK_POLL_ATTEMPTS`: task poll attempts (default: 60)
    /// - `F5_SDK_TASK_POLL_DELAY_MS`: delay between polls (default: 1000)
    /// - `F5_SDK_CATALOG_URL`: catalog URL, or "bundled" to skip the fetch
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("F5_SDK_HOST")
            .ok_or_else(|| SdkError::Config("F5_SDK_HOST is not set".to_string()))?;
        let mut config = Self::new(host);

        if let Some(port) = lookup("F5_SDK_PORT") {
            config.port = port
                .parse()
                .map_err(|e| SdkError::Config(format!("invalid F5_SDK_PORT: {}", e)))?;
        }

        config.tls_verify = lookup("F5_SDK_TLS_VERIFY")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        if let Some(ms) = lookup("F5_SDK_REQUEST_TIMEOUT_MS") {
            let ms: u64 = ms.parse().map_err(|e| {
                SdkError::Config(format!("invalid F5_SDK_REQUEST_TIMEOUT_MS: {}", e))
            })?;
            config.request_timeout = Duration::from_millis(ms);
        }

        if let Some(attempts) = lookup("F5_SDK_TASK_POLL_ATTEMPTS") {
            config.task_retry.max_attempts = attempts.parse().map_err(|e| {
                SdkError::Config(format!("invalid F5_SDK_TASK_POLL_ATTEMPTS: {}", e))
            })?;
        }

        if let Some(ms) = lookup("F5_SDK_TASK_POLL_DELAY_MS") {
            let ms: u64 = ms.parse().map_err(|e| {
                SdkError::Config(format!("invalid F5_SDK_TASK_POLL_DELAY_MS: {}", e))
            })?;
            config.task_retry.delay = Duration::from_millis(ms);
        }

        if let Some(url) = lookup("F5_SDK_CATALOG_URL") {
            config.catalog = if url.eq_ignore_ascii_case("bundled") {
                CatalogSource::Bundled
            } else {
                CatalogSource::Remote(url)
            };
        }

        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_auth_retry(mut self, policy: RetryPolicy) -> Self {
        self.auth_retry = policy;
        self
    }

    pub fn with_task_retry(mut self, policy: RetryPolicy) -> Self {
        self.task_retry = policy;
        self
    }

    pub fn with_ready_retry(mut self, policy: RetryPolicy) -> Self {
        self.ready_retry = policy;
        self
    }

    pub fn with_token_timeout(mut self, timeout: Duration) -> Self {
        self.token_timeout = timeout;
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogSource) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}
