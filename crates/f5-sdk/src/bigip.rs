// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! BIG-IP management client.

use std::sync::Arc;

use f5_http::{Transport, UreqTransport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::auth::BigIpAuth;
use crate::config::{ClientConfig, Credentials};
use crate::error::{Result, SdkError};
use crate::logging::Logger;
use crate::retry::{Outcome, Step};
use crate::session::{RequestOptions, SessionManager};

pub const DEVICE_INFO_URI: &str = "/mgmt/shared/identified-devices/config/device-info";
pub const SYS_READY_URI: &str = "/mgmt/tm/sys/ready";

/// Identity of the managed device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub hostname: String,
    pub product: String,
    pub version: String,
    pub build: String,
}

/// Authenticated client for one BIG-IP device.
///
/// Construction performs the token acquisition; every later call reuses the
/// session and refreshes the token once it expires.
#[derive(Debug)]
pub struct ManagementClient {
    session: SessionManager,
    logger: Logger,
}

impl ManagementClient {
    /// Connect with the `ureq` transport and authenticate.
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        Self::with_transport(config, credentials, Arc::new(UreqTransport::new()))
    }

    /// Connect over `transport` and authenticate.
    pub fn with_transport(
        config: ClientConfig,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let logger = config.logger.clone();
        logger.clone().scope(|| {
            let session = SessionManager::new(config, credentials, Box::new(BigIpAuth), transport);
            session.authenticate()?;
            info!(host = %session.config().host, "BIG-IP session established");
            Ok(Self { session, logger })
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.session.config()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Authenticated request returning the parsed body.
    pub fn make_request(&self, uri: &str, options: RequestOptions) -> Result<Value> {
        self.logger
            .scope(|| self.session.authenticated_request(uri, options))
    }

    /// Authenticated request returning body and status code.
    pub fn make_request_with_status(
        &self,
        uri: &str,
        options: RequestOptions,
    ) -> Result<(Value, u16)> {
        self.logger
            .scope(|| self.session.authenticated_request_with_status(uri, options))
    }

    /// Device hostname, product and software version.
    pub fn get_info(&self) -> Result<DeviceInfo> {
        self.logger.scope(|| self.fetch_info())
    }

    #[instrument(name = "get_info", skip(self))]
    fn fetch_info(&self) -> Result<DeviceInfo> {
        let body = self
            .session
            .authenticated_request(DEVICE_INFO_URI, RequestOptions::get())?;
        Ok(serde_json::from_value(body)?)
    }

    /// Whether every readiness check on the device currently reports `yes`.
    pub fn is_ready(&self) -> Result<bool> {
        self.logger.scope(|| {
            let body = self
                .session
                .authenticated_request(SYS_READY_URI, RequestOptions::get())?;
            Ok(readiness_complete(&body))
        })
    }

    /// Block until the device reports ready, within
    /// [`ClientConfig::ready_retry`].
    pub fn wait_until_ready(&self) -> Result<()> {
        self.logger.scope(|| self.poll_ready())
    }

    #[instrument(name = "wait_until_ready", skip(self))]
    fn poll_ready(&self) -> Result<()> {
        let policy = self.config().ready_retry;
        let outcome = policy.run("device readiness", |attempt| {
            let body = self
                .session
                .authenticated_request(SYS_READY_URI, RequestOptions::get())?;
            if readiness_complete(&body) {
                Ok(Step::Done(()))
            } else {
                debug!(attempt, "Device not ready yet");
                Ok(Step::Pending)
            }
        })?;

        match outcome {
            Outcome::Completed(()) => {
                info!("Device is ready");
                Ok(())
            }
            Outcome::Exhausted { attempts, .. } => Err(SdkError::Timeout {
                operation: "device readiness".to_string(),
                attempts,
            }),
        }
    }
}

/// Every `nestedStats.entries.*.description` under `entries` equals `yes`.
///
/// ```text
/// {"entries": {"https://localhost/mgmt/tm/sys/ready/0": {"nestedStats": {"entries": {
///     "configReady": {"description": "yes"}, "licenseReady": {"description": "yes"}, ...}}}}}
/// ```
fn readiness_complete(body: &Value) -> bool {
    let checks: Vec<&str> = body
        .get("entries")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|entries| entries.values())
        .filter_map(|entry| entry.pointer("/nestedStats/entries").and_then(Value::as_object))
        .flat_map(|stats| stats.values())
        .filter_map(|stat| stat.get("description").and_then(Value::as_str))
        .collect();

    !checks.is_empty() && checks.iter().all(|value| value.eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ready_body(config: &str, license: &str) -> Value {
        json!({"entries": {"https://localhost/mgmt/tm/sys/ready/0": {"nestedStats": {"entries": {
            "configReady": {"description": config},
            "licenseReady": {"description": license},
            "provisionReady": {"description": "yes"}
        }}}}})
    }

    #[test]
    fn test_readiness_complete() {
        assert!(readiness_complete(&ready_body("yes", "yes")));
        assert!(!readiness_complete(&ready_body("yes", "no")));
        assert!(!readiness_complete(&json!({})));
    }
}
