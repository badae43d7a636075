// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Session and token management.
//!
//! [`SessionManager`] owns the client's [`Session`] and is the only way to
//! issue an authenticated request. Each request goes through the same
//! pipeline: refresh an expired token, require a token, inject the auth
//! header, send, classify the error, and retry when the caller asked for it.

use std::cell::RefCell;
use std::sync::Arc;

use f5_http::{Body, HttpRequest, HttpResponse, Method, Transport};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::auth::{AuthScheme, Token};
use crate::config::{ClientConfig, Credentials};
use crate::error::{Result, SdkError};
use crate::retry::RetryPolicy;

/// Options for one authenticated request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method (default: GET).
    pub method: Method,
    /// Request body (default: empty).
    pub body: Body,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Retry transient failures under this policy (default: single attempt).
    pub retry: Option<RetryPolicy>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self::with_json(Method::Post, body)
    }

    pub fn put(body: Value) -> Self {
        Self::with_json(Method::Put, body)
    }

    pub fn patch(body: Value) -> Self {
        Self::with_json(Method::Patch, body)
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            ..Self::default()
        }
    }

    fn with_json(method: Method, body: Value) -> Self {
        Self {
            method,
            body: Body::Json(body),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_raw_body(mut self, bytes: Vec<u8>) -> Self {
        self.body = Body::Raw(bytes);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }
}

/// Connection state of one client.
#[derive(Debug, Clone)]
pub struct Session {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    /// `None` until [`SessionManager::authenticate`] succeeds.
    pub token: Option<Token>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Owns the session and sends every authenticated request.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    scheme: Box<dyn AuthScheme>,
    config: ClientConfig,
    session: RefCell<Session>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("scheme", &self.scheme)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create an unauthenticated manager. Call [`Self::authenticate`] before
    /// sending requests.
    pub fn new(
        config: ClientConfig,
        credentials: Credentials,
        scheme: Box<dyn AuthScheme>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let session = Session {
            host: config.host.clone(),
            port: config.port,
            credentials,
            token: None,
        };
        Self {
            transport,
            scheme,
            config,
            session: RefCell::new(session),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn token(&self) -> Option<Token> {
        self.session.borrow().token.clone()
    }

    /// Acquire a token, retrying transient failures under
    /// [`ClientConfig::auth_retry`]. Rejected credentials fail on the first
    /// attempt.
    pub fn authenticate(&self) -> Result<Token> {
        self.config.logger.scope(|| self.acquire_token())
    }

    #[instrument(name = "authenticate", skip(self), fields(host = %self.config.host))]
    fn acquire_token(&self) -> Result<Token> {
        let credentials = self.session.borrow().credentials.clone();
        let token = self.config.auth_retry.retry("authenticate", |attempt| {
            debug!(attempt, "Login attempt");
            self.scheme
                .login(self.transport.as_ref(), &self.config, &credentials)
        })?;

        self.session.borrow_mut().token = Some(token.clone());
        Ok(token)
    }

    fn refresh_if_expired(&self) -> Result<()> {
        let expired = self
            .session
            .borrow()
            .token
            .as_ref()
            .is_some_and(Token::is_expired);
        if expired {
            info!("Token expired, re-authenticating");
            self.authenticate()?;
        }
        Ok(())
    }

    fn build_request(&self, uri: &str, options: &RequestOptions) -> Result<HttpRequest> {
        let token = self
            .session
            .borrow()
            .token
            .clone()
            .ok_or(SdkError::AuthenticationRequired)?;
        let (auth_name, auth_value) = self.scheme.auth_header(&token);

        let mut request =
            HttpRequest::to_host(options.method, &self.config.host, self.config.port, uri)
                .timeout(self.config.request_timeout)
                .tls_verify(self.config.tls_verify)
                .header(auth_name, auth_value)
                .query(&options.query)
                .body(options.body.clone());
        for (name, value) in &options.headers {
            request = request.header(name.clone(), value.clone());
        }
        Ok(request)
    }

    /// Send an authenticated request and return the full response.
    pub fn send(&self, uri: &str, options: &RequestOptions) -> Result<HttpResponse> {
        let attempt = || -> Result<HttpResponse> {
            self.refresh_if_expired()?;
            let request = self.build_request(uri, options)?;
            debug!(method = %request.method, uri, "Sending request");
            Ok(self.transport.send(&request)?)
        };

        match options.retry {
            Some(policy) => policy.retry(uri, |_| attempt()),
            None => attempt(),
        }
    }

    /// Send an authenticated request and return the parsed body
    /// (`Value::Null` when empty).
    pub fn authenticated_request(&self, uri: &str, options: RequestOptions) -> Result<Value> {
        Ok(self.send(uri, &options)?.into_body())
    }

    /// Like [`Self::authenticated_request`], also returning the status code.
    pub fn authenticated_request_with_status(
        &self,
        uri: &str,
        options: RequestOptions,
    ) -> Result<(Value, u16)> {
        Ok(self.send(uri, &options)?.into_body_and_status())
    }

    /// `true` on 2xx, `false` on an error status. Transport failures and a
    /// missing token still propagate.
    pub fn exists(&self, uri: &str) -> Result<bool> {
        self.refresh_if_expired()?;
        let request = self.build_request(uri, &RequestOptions::get())?;
        Ok(f5_http::exists(self.transport.send(&request))?)
    }
}
