// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Transport trait and the ureq implementation.

use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::error::{HttpError, Result};
use crate::request::{Body, HttpRequest, Method};
use crate::response::{HttpResponse, parse_body};

/// Issues one HTTP exchange per call. Implementations must not retry.
pub trait Transport: Send + Sync {
    /// Send a request. 4xx/5xx responses come back as [`HttpError::Status`].
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;

    /// Stream `url` into `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &Path, timeout: Duration, tls_verify: bool)
        -> Result<u64>;
}

/// Blocking transport backed by `ureq`.
///
/// A fresh agent is built per call, so no connection is reused between
/// requests.
#[derive(Debug, Default, Clone)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }

    fn agent(&self, timeout: Duration, tls_verify: bool) -> Result<ureq::Agent> {
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(!tls_verify)
            .danger_accept_invalid_hostnames(!tls_verify)
            .build()
            .map_err(|e| HttpError::Transport(format!("TLS setup failed: {}", e)))?;

        Ok(ureq::AgentBuilder::new()
            .timeout(timeout)
            .tls_connector(Arc::new(connector))
            .build())
    }
}

impl Transport for UreqTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let agent = self.agent(request.timeout, request.tls_verify)?;
        let mut call = agent.request(request.method.as_str(), &request.url);

        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match &request.body {
            Body::Empty => call.call(),
            Body::Json(value) => {
                let payload = serde_json::to_vec(value)
                    .map_err(|e| HttpError::InvalidRequest(e.to_string()))?;
                if request.header_value("Content-Type").is_none() {
                    call = call.set("Content-Type", "application/json");
                }
                call.send_bytes(&payload)
            }
            Body::Raw(bytes) => call.send_bytes(bytes),
        };

        match result {
            Ok(response) => {
                let status = response.status();
                let response = read_response(status, response)?;
                debug!(status, "Request completed");
                Ok(response)
            }
            Err(ureq::Error::Status(status, response)) => {
                let reason = response.status_text().to_string();
                let body = read_response(status, response)?.body;
                debug!(status, %reason, "Request returned error status");
                Err(HttpError::Status {
                    status,
                    reason,
                    body,
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(HttpError::Transport(transport.to_string()))
            }
        }
    }

    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    fn download(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
        tls_verify: bool,
    ) -> Result<u64> {
        let agent = self.agent(timeout, tls_verify)?;
        let response = match agent.request(Method::Get.as_str(), url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(HttpError::Status {
                    status,
                    reason: response.status_text().to_string(),
                    body: None,
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(HttpError::Transport(transport.to_string()));
            }
        };

        let mut reader = response.into_reader();
        let mut writer = BufWriter::new(File::create(dest)?);
        let written = std::io::copy(&mut reader, &mut writer)?;
        debug!(bytes = written, "Download finished");
        Ok(written)
    }
}

fn read_response(status: u16, response: ureq::Response) -> Result<HttpResponse> {
    let headers = response
        .headers_names()
        .into_iter()
        .filter_map(|name| {
            response
                .header(&name)
                .map(|value| (name.clone(), value.to_string()))
        })
        .collect();

    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes)?;

    let mut parsed = HttpResponse {
        status,
        headers,
        body: None,
    };
    parsed.body = parse_body(status, parsed.header("Content-Length"), &bytes);
    Ok(parsed)
}
