// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Management SDK for F5 BIG-IP devices and F5 Cloud Services.
//!
//! The SDK is blocking and single-threaded per client. It provides:
//!
//! - [`ManagementClient`] / [`CloudServicesClient`]: authenticated sessions
//!   that inject and refresh tokens on every request.
//! - [`TaskPoller`]: one polling loop for every flavor of long-running
//!   operation the device exposes.
//! - [`ExtensionClient`]: install, query and uninstall extension packages
//!   (AS3, DO, TS, CF, FAST) and talk to their service endpoints.
//!
//! # Example
//!
//! ```no_run
//! use f5_sdk::{ClientConfig, Credentials, ExtensionClient, InstallOptions, ManagementClient};
//!
//! # fn example() -> f5_sdk::Result<()> {
//! let config = ClientConfig::new("192.0.2.10");
//! let client = ManagementClient::new(config, Credentials::new("admin", "admin"))?;
//!
//! let as3 = ExtensionClient::new(&client, "as3", None)?;
//! if !as3.package().is_installed()?.installed {
//!     as3.package().install(InstallOptions::default())?;
//! }
//! as3.service().wait_for_availability()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The SDK logs through `tracing`. Nothing is printed unless a subscriber is
//! installed, globally or per client via [`ClientConfig::with_logger`].

pub mod auth;
pub mod bigip;
pub mod catalog;
pub mod cloud_services;
pub mod config;
pub mod error;
pub mod extension;
pub mod logging;
pub mod retry;
pub mod session;
pub mod task;
pub mod upload;

pub use auth::{AuthScheme, BigIpAuth, CloudServicesAuth, Token};
pub use bigip::{DeviceInfo, ManagementClient};
pub use catalog::{ExtensionCatalog, ResolvedComponent};
pub use cloud_services::CloudServicesClient;
pub use config::{CatalogSource, ClientConfig, Credentials};
pub use error::{Result, SdkError};
pub use extension::{
    ExtensionClient, InstallOptions, InstallSource, InstallStatus, OperationResult,
    PackageClient, ServiceClient,
};
pub use logging::Logger;
pub use retry::RetryPolicy;
pub use session::{RequestOptions, Session, SessionManager};
pub use task::{PollDecision, TaskPoller, TaskReference, TaskSignal, TaskState};
