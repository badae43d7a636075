// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Token acquisition schemes.
//!
//! An [`AuthScheme`] turns credentials into a [`Token`] and knows which header
//! carries it. [`BigIpAuth`] talks to the device's iControl REST login
//! endpoint; [`CloudServicesAuth`] talks to the Cloud Services API.

use std::fmt;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use f5_http::{HttpError, HttpRequest, Method, Transport};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::{ClientConfig, Credentials};
use crate::error::{Result, SdkError};

pub const BIGIP_LOGIN_URI: &str = "/mgmt/shared/authn/login";
pub const BIGIP_TOKENS_URI: &str = "/mgmt/shared/authz/tokens";
pub const BIGIP_AUTH_HEADER: &str = "X-F5-Auth-Token";
pub const CLOUD_SERVICES_LOGIN_URI: &str = "/v1/svc-auth/login";

/// Bearer-style token with its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchanges credentials for a token.
pub trait AuthScheme: fmt::Debug + Send + Sync {
    /// Perform one complete acquisition. Implementations do not retry.
    fn login(
        &self,
        transport: &dyn Transport,
        config: &ClientConfig,
        credentials: &Credentials,
    ) -> Result<Token>;

    /// Header name and value that carry `token` on authenticated requests.
    fn auth_header(&self, token: &Token) -> (String, String);
}

/// Map a login failure: 401/403 are definitive, everything else stays an HTTP error.
fn login_error(err: HttpError) -> SdkError {
    match err.status() {
        Some(status @ (401 | 403)) => SdkError::InvalidCredentials {
            status,
            message: err.message(),
        },
        _ => SdkError::Http(err),
    }
}

fn lifetime(config: &ClientConfig) -> TimeDelta {
    TimeDelta::from_std(config.token_timeout).unwrap_or_else(|_| TimeDelta::hours(1))
}

fn request(config: &ClientConfig, method: Method, uri: &str) -> HttpRequest {
    HttpRequest::to_host(method, &config.host, config.port, uri)
        .timeout(config.request_timeout)
        .tls_verify(config.tls_verify)
}

/// BIG-IP token login.
///
/// Acquisition is two requests: the login itself, then a PATCH on the new
/// token raising its timeout to [`ClientConfig::token_timeout`]. The device
/// default (20 minutes) is too short for long package installs.
#[derive(Debug, Default, Clone)]
pub struct BigIpAuth;

impl AuthScheme for BigIpAuth {
    fn login(
        &self,
        transport: &dyn Transport,
        config: &ClientConfig,
        credentials: &Credentials,
    ) -> Result<Token> {
        debug!(host = %config.host, user = %credentials.username, "Requesting token");

        let login = request(config, Method::Post, BIGIP_LOGIN_URI).json(json!({
            "username": credentials.username,
            "password": credentials.password,
            "loginProviderName": "tmos",
        }));
        let response = transport.send(&login).map_err(login_error)?;

        let token = response
            .body()
            .pointer("/token/token")
            .and_then(Value::as_str)
            .ok_or_else(|| SdkError::UnexpectedResponse("login response has no token".to_string()))?
            .to_string();

        let timeout_secs = config.token_timeout.as_secs();
        let extend = request(
            config,
            Method::Patch,
            &format!("{}/{}", BIGIP_TOKENS_URI, token),
        )
        .header(BIGIP_AUTH_HEADER, token.clone())
        .json(json!({ "timeout": timeout_secs }));
        transport.send(&extend)?;

        info!(host = %config.host, timeout_secs, "Token acquired");
        Ok(Token::new(token, Utc::now() + lifetime(config)))
    }

    fn auth_header(&self, token: &Token) -> (String, String) {
        (BIGIP_AUTH_HEADER.to_string(), token.value.clone())
    }
}

/// Cloud Services login: `access_token` plus an absolute `expires_at`.
#[derive(Debug, Default, Clone)]
pub struct CloudServicesAuth;

impl AuthScheme for CloudServicesAuth {
    fn login(
        &self,
        transport: &dyn Transport,
        config: &ClientConfig,
        credentials: &Credentials,
    ) -> Result<Token> {
        debug!(host = %config.host, user = %credentials.username, "Requesting access token");

        let login = request(config, Method::Post, CLOUD_SERVICES_LOGIN_URI).json(json!({
            "username": credentials.username,
            "password": credentials.password,
        }));
        let response = transport.send(&login).map_err(login_error)?;
        let body = response.body();

        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SdkError::UnexpectedResponse("login response has no access_token".to_string())
            })?;

        let expires_at = body
            .get("expires_at")
            .and_then(Value::as_i64)
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(|| Utc::now() + lifetime(config));

        info!(host = %config.host, %expires_at, "Access token acquired");
        Ok(Token::new(token, expires_at))
    }

    fn auth_header(&self, token: &Token) -> (String, String) {
        (
            "Authorization".to_string(),
            format!("Bearer {}", token.value),
        )
    }
}
