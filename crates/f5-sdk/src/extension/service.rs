// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Capability endpoints of an installed extension.

use f5_http::Method;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::bigip::ManagementClient;
use crate::catalog::{Endpoint, ResolvedComponent};
use crate::error::{Result, SdkError};
use crate::retry::{Outcome, Step};
use crate::session::RequestOptions;
use crate::task::TaskPoller;

pub const INFO_ENDPOINT: &str = "info";
pub const CONFIGURE_ENDPOINT: &str = "configure";
pub const INSPECT_ENDPOINT: &str = "inspect";
pub const TRIGGER_ENDPOINT: &str = "trigger";
pub const RESET_ENDPOINT: &str = "reset";

/// An endpoint without a method list accepts anything.
fn accepts(endpoint: &Endpoint, method: Method) -> bool {
    endpoint.methods.is_empty()
        || endpoint
            .methods
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(method.as_str()))
}

#[derive(Debug)]
pub struct ServiceClient<'a> {
    client: &'a ManagementClient,
    component: &'a ResolvedComponent,
}

impl<'a> ServiceClient<'a> {
    pub fn new(client: &'a ManagementClient, component: &'a ResolvedComponent) -> Self {
        Self { client, component }
    }

    /// URI of endpoint `name`, checking that it accepts `method`.
    fn uri(&self, name: &str, method: Method) -> Result<&str> {
        let endpoint = self.component.endpoint(name)?;
        if !accepts(endpoint, method) {
            return Err(SdkError::InvalidInput(format!(
                "{} {} endpoint does not accept {}",
                self.component.component, name, method
            )));
        }
        Ok(&endpoint.uri)
    }

    /// Whether the info endpoint answers with a 2xx.
    pub fn is_available(&self) -> Result<bool> {
        let uri = self.uri(INFO_ENDPOINT, Method::Get)?;
        self.client.logger().scope(|| match self.client.session().exists(uri) {
            Ok(available) => Ok(available),
            Err(err) if err.is_retryable() => Ok(false),
            Err(err) => Err(err),
        })
    }

    /// Poll the info endpoint under [`ClientConfig::ready_retry`] until the
    /// service answers.
    ///
    /// [`ClientConfig::ready_retry`]: crate::config::ClientConfig::ready_retry
    pub fn wait_for_availability(&self) -> Result<()> {
        self.client.logger().scope(|| self.poll_availability())
    }

    #[instrument(name = "wait_for_availability", skip(self), fields(component = %self.component.component))]
    fn poll_availability(&self) -> Result<()> {
        let operation = format!("{} availability", self.component.component);
        let policy = self.client.config().ready_retry;
        let outcome = policy.run(&operation, |attempt| {
            if self.is_available()? {
                Ok(Step::Done(()))
            } else {
                debug!(attempt, "Service not available yet");
                Ok(Step::Pending)
            }
        })?;

        match outcome {
            Outcome::Completed(()) => {
                info!("Service is available");
                Ok(())
            }
            Outcome::Exhausted { attempts, .. } => Err(SdkError::Timeout {
                operation,
                attempts,
            }),
        }
    }

    pub fn show_info(&self) -> Result<Value> {
        self.get(INFO_ENDPOINT)
    }

    /// Current declaration.
    pub fn show(&self) -> Result<Value> {
        self.get(CONFIGURE_ENDPOINT)
    }

    /// Submit a declaration and wait for it to be applied.
    pub fn create(&self, config: Value) -> Result<Value> {
        self.client.logger().scope(|| self.declare(config))
    }

    #[instrument(name = "create", skip(self, config), fields(component = %self.component.component))]
    fn declare(&self, config: Value) -> Result<Value> {
        self.post(CONFIGURE_ENDPOINT, config)
    }

    /// Remove the current declaration.
    pub fn delete(&self) -> Result<Value> {
        let uri = self.uri(CONFIGURE_ENDPOINT, Method::Delete)?;
        self.client.make_request(uri, RequestOptions::delete())
    }

    pub fn show_inspect(&self) -> Result<Value> {
        self.get(INSPECT_ENDPOINT)
    }

    pub fn show_trigger(&self) -> Result<Value> {
        self.get(TRIGGER_ENDPOINT)
    }

    /// Trigger a failover (CF).
    pub fn trigger(&self, config: Value) -> Result<Value> {
        self.post(TRIGGER_ENDPOINT, config)
    }

    /// Reset service state (CF).
    pub fn reset(&self, config: Value) -> Result<Value> {
        self.post(RESET_ENDPOINT, config)
    }

    fn get(&self, name: &str) -> Result<Value> {
        let uri = self.uri(name, Method::Get)?;
        self.client.make_request(uri, RequestOptions::get())
    }

    fn post(&self, name: &str, body: Value) -> Result<Value> {
        let uri = self.uri(name, Method::Post)?;
        self.client.logger().scope(|| {
            let session = self.client.session();
            let (response, status) =
                session.authenticated_request_with_status(uri, RequestOptions::post(body))?;
            TaskPoller::with_defaults(session).resolve(status, response)
        })
    }
}
