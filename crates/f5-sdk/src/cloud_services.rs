// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cloud Services management client.

use std::sync::Arc;

use f5_http::{Transport, UreqTransport};
use serde_json::Value;
use tracing::info;

use crate::auth::CloudServicesAuth;
use crate::config::{ClientConfig, Credentials};
use crate::error::Result;
use crate::logging::Logger;
use crate::session::{RequestOptions, SessionManager};

/// API version prefix for Cloud Services resources.
pub const API_VERSION: &str = "v1";

/// Authenticated client for the Cloud Services API.
#[derive(Debug)]
pub struct CloudServicesClient {
    session: SessionManager,
    logger: Logger,
}

impl CloudServicesClient {
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        Self::with_transport(config, credentials, Arc::new(UreqTransport::new()))
    }

    pub fn with_transport(
        config: ClientConfig,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let logger = config.logger.clone();
        logger.clone().scope(|| {
            let session =
                SessionManager::new(config, credentials, Box::new(CloudServicesAuth), transport);
            session.authenticate()?;
            info!(host = %session.config().host, "Cloud Services session established");
            Ok(Self { session, logger })
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// `/v1/{path}` for a resource path such as `subscriptions`.
    pub fn uri(path: &str) -> String {
        format!("/{}/{}", API_VERSION, path.trim_start_matches('/'))
    }

    pub fn make_request(&self, uri: &str, options: RequestOptions) -> Result<Value> {
        self.logger
            .scope(|| self.session.authenticated_request(uri, options))
    }

    pub fn make_request_with_status(
        &self,
        uri: &str,
        options: RequestOptions,
    ) -> Result<(Value, u16)> {
        self.logger
            .scope(|| self.session.authenticated_request_with_status(uri, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CLOUD_SERVICES_LOGIN_URI;
    use f5_http::Method;
    use f5_http::mock::MockTransport;
    use serde_json::json;

    #[test]
    fn test_uri() {
        assert_eq!(CloudServicesClient::uri("subscriptions"), "/v1/subscriptions");
        assert_eq!(CloudServicesClient::uri("/svc-auth/login"), "/v1/svc-auth/login");
    }

    #[test]
    fn test_bearer_token_on_requests() {
        let mock = Arc::new(MockTransport::new());
        mock.reply_json(
            Method::Post,
            CLOUD_SERVICES_LOGIN_URI,
            200,
            json!({"access_token": "jwt-token", "expires_at": 4_102_444_800i64}),
        )
        .reply_json(
            Method::Get,
            "/v1/subscriptions",
            200,
            json!({"subscriptions": []}),
        );

        let client = CloudServicesClient::with_transport(
            ClientConfig::cloud_services(),
            Credentials::new("user@example.com", "pw"),
            mock.clone(),
        )
        .unwrap();

        let body = client
            .make_request(&CloudServicesClient::uri("subscriptions"), RequestOptions::get())
            .unwrap();
        assert_eq!(body["subscriptions"], json!([]));

        let sent = &mock.requests_to(Method::Get, "/v1/subscriptions")[0];
        assert_eq!(sent.header_value("Authorization"), Some("Bearer jwt-token"));
        assert!(sent.url.starts_with("https://api.cloudservices.f5.com:443/"));
        assert!(sent.tls_verify);
    }
}
