// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Extension component catalog.
//!
//! Maps component → version → artifact location and package name, plus the
//! component's capability endpoints and the components that depend on it.
//! Loaded once per client and read-only afterwards.

use std::collections::BTreeMap;
use std::time::Duration;

use f5_http::{HttpRequest, Method, Transport};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CatalogSource;
use crate::error::{Result, SdkError};
use crate::extension::version;

const BUNDLED: &str = include_str!("metadata.json");

/// A capability endpoint of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub uri: String,
    #[serde(default)]
    pub methods: Vec<String>,
}

/// One published version of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub download_url: String,
    pub package_name: String,
    #[serde(default)]
    pub latest: bool,
}

/// Comparison operator of a dependency declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionOperator {
    AtLeast,
    AtMost,
}

/// Another component that relies on this one when installed in a flagged
/// version range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub component: String,
    pub package_prefix: String,
    pub operator: VersionOperator,
    pub version: String,
    /// Where the remediation steps are documented.
    pub reference: String,
}

impl Dependency {
    /// Whether `installed` falls in the flagged range.
    pub fn is_flagged(&self, installed: &str) -> bool {
        match version::compare(installed, &self.version) {
            Some(ordering) => match self.operator {
                VersionOperator::AtLeast => ordering.is_ge(),
                VersionOperator::AtMost => ordering.is_le(),
            },
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntry {
    #[serde(default)]
    pub endpoints: BTreeMap<String, Endpoint>,
    pub versions: BTreeMap<String, VersionEntry>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl ComponentEntry {
    /// Version flagged `latest`, else the highest semantic version.
    pub fn latest_version(&self) -> Option<&str> {
        self.versions
            .iter()
            .find(|(_, entry)| entry.latest)
            .map(|(version, _)| version.as_str())
            .or_else(|| {
                self.versions
                    .keys()
                    .max_by(|a, b| version::compare(a, b).unwrap_or(a.cmp(b)))
                    .map(String::as_str)
            })
    }
}

/// Everything needed to act on one component version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedComponent {
    pub component: String,
    pub version: String,
    pub download_url: String,
    pub package_name: String,
    pub latest_version: String,
    pub endpoints: BTreeMap<String, Endpoint>,
    pub dependencies: Vec<Dependency>,
}

impl ResolvedComponent {
    pub fn endpoint(&self, name: &str) -> Result<&Endpoint> {
        self.endpoints
            .get(name)
            .ok_or_else(|| SdkError::UnsupportedEndpoint {
                component: self.component.clone(),
                endpoint: name.to_string(),
            })
    }

    /// Package name without version, release and architecture.
    pub fn package_prefix(&self) -> &str {
        version::package_prefix(&self.package_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionCatalog {
    components: BTreeMap<String, ComponentEntry>,
}

impl ExtensionCatalog {
    /// Parse a catalog document.
    pub fn from_json(document: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(document)?;
        if catalog.components.is_empty() {
            return Err(SdkError::Serialization(
                "catalog declares no components".to_string(),
            ));
        }
        Ok(catalog)
    }

    /// The document compiled into this crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED)
    }

    /// Load from `source`. A failed remote fetch is logged and the bundled
    /// document used instead.
    pub fn load(transport: &dyn Transport, source: &CatalogSource, timeout: Duration) -> Result<Self> {
        match source {
            CatalogSource::Bundled => Self::bundled(),
            CatalogSource::Remote(url) => match Self::fetch(transport, url, timeout) {
                Ok(catalog) => {
                    debug!(%url, "Loaded remote catalog");
                    Ok(catalog)
                }
                Err(err) => {
                    warn!(%url, error = %err, "Remote catalog unavailable, using bundled catalog");
                    Self::bundled()
                }
            },
        }
    }

    fn fetch(transport: &dyn Transport, url: &str, timeout: Duration) -> Result<Self> {
        let request = HttpRequest::new(Method::Get, url)
            .timeout(timeout)
            .tls_verify(true);
        let body = transport.send(&request)?.into_body();
        let catalog: Self = serde_json::from_value(body)?;
        if catalog.components.is_empty() {
            return Err(SdkError::Serialization(
                "catalog declares no components".to_string(),
            ));
        }
        Ok(catalog)
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn component(&self, name: &str) -> Result<&ComponentEntry> {
        self.components
            .get(name)
            .ok_or_else(|| SdkError::UnknownComponent(name.to_string()))
    }

    pub fn latest_version(&self, component: &str) -> Result<String> {
        self.component(component)?
            .latest_version()
            .map(str::to_string)
            .ok_or_else(|| SdkError::UnknownVersion {
                component: component.to_string(),
                version: "latest".to_string(),
            })
    }

    /// Resolve `component` at `version`, or at its latest version when `None`.
    pub fn resolve(&self, component: &str, version: Option<&str>) -> Result<ResolvedComponent> {
        let entry = self.component(component)?;
        let latest_version = self.latest_version(component)?;
        let version = version.map(str::to_string).unwrap_or_else(|| latest_version.clone());

        let version_entry = entry
            .versions
            .get(&version)
            .ok_or_else(|| SdkError::UnknownVersion {
                component: component.to_string(),
                version: version.clone(),
            })?;

        Ok(ResolvedComponent {
            component: component.to_string(),
            version,
            download_url: version_entry.download_url.clone(),
            package_name: version_entry.package_name.clone(),
            latest_version,
            endpoints: entry.endpoints.clone(),
            dependencies: entry.dependencies.clone(),
        })
    }
}
