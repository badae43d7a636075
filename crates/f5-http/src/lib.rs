// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Blocking HTTP transport for the F5 management SDK.
//!
//! This crate issues exactly one HTTP request per call. It never retries:
//! retry budgets, token injection and task polling live in `f5-sdk`.
//!
//! - [`HttpRequest`] is the per-call request descriptor.
//! - [`HttpResponse`] carries the status code, headers and a parsed body,
//!   normalized to `None` for empty responses.
//! - [`Transport`] is the seam the SDK talks to; [`UreqTransport`] is the
//!   production implementation.
//!
//! # Example
//!
//! ```no_run
//! use f5_http::{HttpRequest, Method, Transport, UreqTransport};
//!
//! # fn example() -> Result<(), f5_http::HttpError> {
//! let transport = UreqTransport::new();
//! let request = HttpRequest::to_host(Method::Get, "192.0.2.10", 443, "/mgmt/tm/sys/ready");
//! let response = transport.send(&request)?;
//! println!("status {}", response.status);
//! # Ok(())
//! # }
//! ```

mod error;
mod request;
mod response;
mod transport;

#[cfg(feature = "mock")]
pub mod mock;

pub use error::{HttpError, Result};
pub use request::{Body, HttpRequest, Method};
pub use response::{HttpResponse, exists, parse_body};
pub use transport::{Transport, UreqTransport};
