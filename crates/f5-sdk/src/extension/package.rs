// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Package lifecycle: query, install and uninstall extension RPMs.
//!
//! All three operations go through the `package-management-tasks` endpoint,
//! which answers with a task the [`TaskPoller`] drives to completion.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::bigip::ManagementClient;
use crate::catalog::ResolvedComponent;
use crate::error::{Result, SdkError};
use crate::extension::version;
use crate::session::RequestOptions;
use crate::task::TaskPoller;
use crate::upload;

pub const PACKAGE_TASKS_URI: &str = "/mgmt/shared/iapp/package-management-tasks";

const PACKAGE_SUFFIX: &str = ".rpm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallStatus {
    pub installed: bool,
    /// Empty when not installed.
    pub installed_version: String,
    pub latest_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub component: String,
    /// Empty when the operation had nothing to act on.
    pub version: String,
}

/// Where the package artifact comes from when not using the catalog URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    /// `http`, `https` or `file` URL of an `.rpm`.
    Url(String),
    /// Local `.rpm` on this machine.
    LocalPath(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    /// `None` installs the catalog artifact for the resolved version.
    pub source: Option<InstallSource>,
    /// Delete a downloaded artifact once uploaded. Local sources are never
    /// deleted.
    pub delete_after_upload: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            source: None,
            delete_after_upload: true,
        }
    }
}

impl InstallOptions {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source = Some(InstallSource::Url(url.into()));
        self
    }

    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(InstallSource::LocalPath(path.into()));
        self
    }

    pub fn keep_downloaded(mut self) -> Self {
        self.delete_after_upload = false;
        self
    }
}

/// Validated artifact location.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArtifactSource {
    Remote { url: String, file_name: String },
    Local(PathBuf),
}

impl ArtifactSource {
    fn validate(source: &InstallSource) -> Result<Self> {
        match source {
            InstallSource::Url(raw) => {
                let url = Url::parse(raw)
                    .map_err(|err| SdkError::InvalidSource(format!("{}: {}", raw, err)))?;
                match url.scheme() {
                    "http" | "https" => Self::remote(&url),
                    "file" => {
                        let path = url.to_file_path().map_err(|_| {
                            SdkError::InvalidSource(format!("{} is not a local file path", raw))
                        })?;
                        Self::local(path)
                    }
                    scheme => Err(SdkError::InvalidSource(format!(
                        "unsupported scheme '{}' in {}",
                        scheme, raw
                    ))),
                }
            }
            InstallSource::LocalPath(path) => Self::local(path.clone()),
        }
    }

    fn remote(url: &Url) -> Result<Self> {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SdkError::InvalidSource(format!("{} names no file", url)))?;
        if !file_name.ends_with(PACKAGE_SUFFIX) {
            return Err(SdkError::InvalidSource(format!(
                "{} is not an {} package",
                url, PACKAGE_SUFFIX
            )));
        }
        Ok(Self::Remote {
            url: url.to_string(),
            file_name,
        })
    }

    fn local(path: PathBuf) -> Result<Self> {
        let is_package = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(PACKAGE_SUFFIX));
        if !is_package {
            return Err(SdkError::InvalidSource(format!(
                "{} is not an {} package",
                path.display(),
                PACKAGE_SUFFIX
            )));
        }
        if !path.is_file() {
            return Err(SdkError::InvalidSource(format!(
                "{} does not exist",
                path.display()
            )));
        }
        Ok(Self::Local(path))
    }
}

/// A file ready to upload. Downloaded artifacts live in a temporary file
/// removed on drop.
enum Artifact {
    Local(PathBuf),
    Downloaded(NamedTempFile),
}

impl Artifact {
    fn path(&self) -> &Path {
        match self {
            Artifact::Local(path) => path,
            Artifact::Downloaded(file) => file.path(),
        }
    }

    fn release(self, delete: bool) -> Result<()> {
        match self {
            Artifact::Local(_) => Ok(()),
            Artifact::Downloaded(file) if delete => Ok(file.close()?),
            Artifact::Downloaded(file) => {
                let (_, path) = file.keep().map_err(|err| SdkError::Io(err.to_string()))?;
                info!(path = %path.display(), "Kept downloaded package");
                Ok(())
            }
        }
    }
}

/// Package operations for one resolved component.
#[derive(Debug)]
pub struct PackageClient<'a> {
    client: &'a ManagementClient,
    component: &'a ResolvedComponent,
}

impl<'a> PackageClient<'a> {
    pub fn new(client: &'a ManagementClient, component: &'a ResolvedComponent) -> Self {
        Self { client, component }
    }

    /// Whether the component is installed, and in which version.
    pub fn is_installed(&self) -> Result<InstallStatus> {
        self.client.logger().scope(|| self.query_status())
    }

    #[instrument(name = "is_installed", skip(self), fields(component = %self.component.component))]
    fn query_status(&self) -> Result<InstallStatus> {
        let packages = self.query_packages()?;
        let installed = find_installed(&packages, self.component.package_prefix());
        let status = match installed {
            Some((_, installed_version)) => InstallStatus {
                installed: true,
                installed_version,
                latest_version: self.component.latest_version.clone(),
            },
            None => InstallStatus {
                installed: false,
                installed_version: String::new(),
                latest_version: self.component.latest_version.clone(),
            },
        };
        debug!(installed = status.installed, version = %status.installed_version, "Queried package");
        Ok(status)
    }

    /// Upload and install the package, then confirm it shows up.
    ///
    /// A source override is validated before anything is sent to the device.
    pub fn install(&self, options: InstallOptions) -> Result<OperationResult> {
        self.client.logger().scope(|| self.install_package(options))
    }

    #[instrument(name = "install", skip(self, options), fields(component = %self.component.component, version = %self.component.version))]
    fn install_package(&self, options: InstallOptions) -> Result<OperationResult> {
        let source = match &options.source {
            Some(source) => ArtifactSource::validate(source)?,
            None => {
                let url = Url::parse(&self.component.download_url)?;
                ArtifactSource::remote(&url)?
            }
        };

        let (artifact, remote_name) = match source {
            ArtifactSource::Local(path) => {
                let name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        SdkError::InvalidSource(format!("{} names no file", path.display()))
                    })?;
                (Artifact::Local(path), name)
            }
            ArtifactSource::Remote { url, file_name } => {
                let staged = self.download(&url, &file_name)?;
                (Artifact::Downloaded(staged), file_name)
            }
        };

        let uploaded = upload::upload_file(self.client.session(), artifact.path(), &remote_name)?;
        artifact.release(options.delete_after_upload)?;

        self.run_task(json!({
            "operation": "INSTALL",
            "packageFilePath": uploaded.remote_path,
        }))?;

        let status = self.query_status()?;
        if !status.installed {
            return Err(SdkError::VerificationFailed {
                component: self.component.component.clone(),
                version: self.component.version.clone(),
            });
        }

        info!(installed_version = %status.installed_version, "Package installed");
        Ok(OperationResult {
            component: self.component.component.clone(),
            version: status.installed_version,
        })
    }

    /// Remove the installed package. Warns when an installed component
    /// depends on this one.
    pub fn uninstall(&self) -> Result<OperationResult> {
        self.client.logger().scope(|| self.uninstall_package())
    }

    #[instrument(name = "uninstall", skip(self), fields(component = %self.component.component))]
    fn uninstall_package(&self) -> Result<OperationResult> {
        let packages = self.query_packages()?;
        let Some((package_name, installed_version)) =
            find_installed(&packages, self.component.package_prefix())
        else {
            warn!("Package is not installed, nothing to uninstall");
            return Ok(OperationResult {
                component: self.component.component.clone(),
                version: String::new(),
            });
        };

        self.warn_dependents(&packages);

        self.run_task(json!({
            "operation": "UNINSTALL",
            "packageName": package_name,
        }))?;

        info!(version = %installed_version, "Package uninstalled");
        Ok(OperationResult {
            component: self.component.component.clone(),
            version: installed_version,
        })
    }

    fn download(&self, url: &str, file_name: &str) -> Result<NamedTempFile> {
        let config = self.client.config();
        let stem = file_name.trim_end_matches(PACKAGE_SUFFIX);
        let mut builder = tempfile::Builder::new();
        builder.prefix(stem).suffix(PACKAGE_SUFFIX);
        let staged = match &config.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let bytes = self.client.session().transport().download(
            url,
            staged.path(),
            config.request_timeout,
            true,
        )?;
        debug!(%url, bytes, path = %staged.path().display(), "Downloaded package");
        Ok(staged)
    }

    fn run_task(&self, body: Value) -> Result<Value> {
        let session = self.client.session();
        let (response, status) =
            session.authenticated_request_with_status(PACKAGE_TASKS_URI, RequestOptions::post(body))?;
        TaskPoller::with_defaults(session).resolve(status, response)
    }

    fn query_packages(&self) -> Result<Vec<Value>> {
        let result = self.run_task(json!({ "operation": "QUERY" }))?;
        Ok(match result.get("queryResponse") {
            Some(Value::Array(packages)) => packages.clone(),
            _ => Vec::new(),
        })
    }

    fn warn_dependents(&self, packages: &[Value]) {
        for dependency in &self.component.dependencies {
            let Some((_, installed)) = find_installed(packages, &dependency.package_prefix) else {
                continue;
            };
            if dependency.is_flagged(&installed) {
                warn!(
                    dependent = %dependency.component,
                    installed_version = %installed,
                    reference = %dependency.reference,
                    "An installed component depends on this package and may stop working"
                );
            }
        }
    }
}

/// `(package name, version)` of the single installed build of `prefix`.
///
/// More than one match is ambiguous and treated as not installed.
fn find_installed(packages: &[Value], prefix: &str) -> Option<(String, String)> {
    let matches: Vec<&str> = packages
        .iter()
        .filter_map(|package| package.get("packageName").and_then(Value::as_str))
        .filter(|name| version::matches_package(prefix, name))
        .collect();

    match matches.as_slice() {
        [] => None,
        [name] => {
            let version = version::parse_version(name).unwrap_or_default();
            Some((name.to_string(), version.to_string()))
        }
        names => {
            warn!(prefix, ?names, "Multiple packages match, treating as not installed");
            None
        }
    }
}
