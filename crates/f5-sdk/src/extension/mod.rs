// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Extension components (AS3, DO, TS, CF, FAST).
//!
//! An [`ExtensionClient`] binds a [`ManagementClient`] to one catalog entry
//! and hands out the package lifecycle and service clients for it.

pub mod package;
pub mod service;
pub mod version;

use tracing::debug;

use crate::bigip::ManagementClient;
use crate::catalog::{ExtensionCatalog, ResolvedComponent};
use crate::error::Result;

pub use package::{InstallOptions, InstallSource, InstallStatus, OperationResult, PackageClient};
pub use service::ServiceClient;

#[derive(Debug)]
pub struct ExtensionClient<'a> {
    client: &'a ManagementClient,
    component: ResolvedComponent,
}

impl<'a> ExtensionClient<'a> {
    /// Load the catalog configured on `client` and resolve `component` at
    /// `version` (latest when `None`).
    pub fn new(client: &'a ManagementClient, component: &str, version: Option<&str>) -> Result<Self> {
        let config = client.config();
        let catalog = client.logger().scope(|| {
            ExtensionCatalog::load(
                client.session().transport(),
                &config.catalog,
                config.request_timeout,
            )
        })?;
        Self::with_catalog(client, &catalog, component, version)
    }

    /// Resolve against an already loaded catalog.
    pub fn with_catalog(
        client: &'a ManagementClient,
        catalog: &ExtensionCatalog,
        component: &str,
        version: Option<&str>,
    ) -> Result<Self> {
        let component = catalog.resolve(component, version)?;
        debug!(component = %component.component, version = %component.version, "Resolved extension");
        Ok(Self { client, component })
    }

    pub fn component(&self) -> &ResolvedComponent {
        &self.component
    }

    pub fn package(&self) -> PackageClient<'_> {
        PackageClient::new(self.client, &self.component)
    }

    pub fn service(&self) -> ServiceClient<'_> {
        ServiceClient::new(self.client, &self.component)
    }
}
