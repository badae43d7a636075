// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Package names and version numbers.
//!
//! RPM package names look like `f5-appsvcs-3.9.0-3.noarch`: a name prefix,
//! a `major.minor.patch` version, a release number and an architecture.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").expect("version pattern is valid"));

static LEADING_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+").expect("version pattern is valid"));

/// First `major.minor.patch` in `text`.
pub fn parse_version(text: &str) -> Option<&str> {
    VERSION.find(text).map(|m| m.as_str())
}

/// Name prefix of a package: `f5-appsvcs-3.9.0-3.noarch` → `f5-appsvcs`.
pub fn package_prefix(package_name: &str) -> &str {
    match VERSION.find(package_name) {
        Some(m) => package_name[..m.start()].trim_end_matches('-'),
        None => package_name,
    }
}

/// Whether `package_name` is a versioned build of `prefix`.
///
/// `f5-appsvcs-templates-1.0.0-1.noarch` is not a build of `f5-appsvcs`.
pub fn matches_package(prefix: &str, package_name: &str) -> bool {
    package_name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|rest| LEADING_VERSION.is_match(rest))
}

/// Semantic comparison; `None` when either side is not a valid version.
pub fn compare(a: &str, b: &str) -> Option<Ordering> {
    let a = semver::Version::parse(a).ok()?;
    let b = semver::Version::parse(b).ok()?;
    Some(a.cmp(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("f5-appsvcs-3.9.0-3.noarch"), Some("3.9.0"));
        assert_eq!(
            parse_version("f5-declarative-onboarding-1.11.0-1.noarch.rpm"),
            Some("1.11.0")
        );
        assert_eq!(parse_version("f5-appsvcs"), None);
    }

    #[test]
    fn test_package_prefix() {
        assert_eq!(package_prefix("f5-appsvcs-3.9.0-3.noarch"), "f5-appsvcs");
        assert_eq!(
            package_prefix("f5-appsvcs-templates-1.0.0-1.noarch"),
            "f5-appsvcs-templates"
        );
        assert_eq!(package_prefix("custom"), "custom");
    }

    #[test]
    fn test_matches_package() {
        assert!(matches_package("f5-appsvcs", "f5-appsvcs-3.9.0-3.noarch"));
        assert!(matches_package("f5-appsvcs", "f5-appsvcs-3.20.0-3.noarch"));
        assert!(!matches_package(
            "f5-appsvcs",
            "f5-appsvcs-templates-1.0.0-1.noarch"
        ));
        assert!(!matches_package("f5-appsvcs", "f5-telemetry-1.10.0-2.noarch"));
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare("3.10.0", "3.9.0"), Some(Ordering::Greater));
        assert_eq!(compare("1.0.0", "1.0.0"), Some(Ordering::Equal));
        assert_eq!(compare("1.0", "1.0.0"), None);
    }
}
