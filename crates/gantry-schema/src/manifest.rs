use crate::types::{RevisionId, ScopeKey, SdkVersion};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("scope_key must not be empty")]
    EmptyScopeKey,
    #[error("bundle_url is not a fetchable location: '{0}' (expected http(s)://...)")]
    InvalidBundleUrl(String),
    #[error("invalid sdk_version: '{0}' (expected 'NN.0.0' or 'UNVERSIONED')")]
    InvalidSdkVersion(String),
}

/// Immutable description of a remotely hosted application: identity, bundle
/// location, runtime version, assets, and whatever extra metadata the
/// publishing service attached.
///
/// Two manifests with the same [`ScopeKey`] represent the same logical
/// application, possibly at different revisions.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Manifest {
    pub scope_key: ScopeKey,
    pub bundle_url: String,
    pub sdk_version: SdkVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<RevisionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<AssetEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer: Option<DeveloperInfo>,
    /// Unrecognized manifest fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AssetEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Present only on manifests served by a development server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DeveloperInfo {
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<String>,
}

impl Manifest {
    /// True when the manifest was served by a development tool rather than
    /// a publishing service. Development manifests are fetched live and
    /// never satisfied from cache.
    pub fn is_development_mode(&self) -> bool {
        self.developer.is_some()
    }

    /// Validate the invariants a parsed manifest must satisfy.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.scope_key.as_str().is_empty() {
            return Err(ManifestError::EmptyScopeKey);
        }
        if !(self.bundle_url.starts_with("http://") || self.bundle_url.starts_with("https://")) {
            return Err(ManifestError::InvalidBundleUrl(self.bundle_url.clone()));
        }
        validate_sdk_version(self.sdk_version.as_str())?;
        Ok(())
    }
}

fn validate_sdk_version(version: &str) -> Result<(), ManifestError> {
    if version == "UNVERSIONED" {
        return Ok(());
    }
    let mut parts = version.split('.');
    let well_formed = parts.next().is_some_and(|major| {
        !major.is_empty() && major.bytes().all(|b| b.is_ascii_digit())
    }) && parts.next() == Some("0")
        && parts.next() == Some("0")
        && parts.next().is_none();
    if well_formed {
        Ok(())
    } else {
        Err(ManifestError::InvalidSdkVersion(version.to_owned()))
    }
}

pub fn parse_manifest_str(input: &str) -> Result<Manifest, ManifestError> {
    let manifest: Manifest = serde_json::from_str(input)?;
    manifest.validate()?;
    Ok(manifest)
}

pub fn parse_manifest_slice(input: &[u8]) -> Result<Manifest, ManifestError> {
    let manifest: Manifest = serde_json::from_slice(input)?;
    manifest.validate()?;
    Ok(manifest)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_manifest() {
        let input = r#"{
            "scope_key": "@user/app-1",
            "bundle_url": "https://host.example.com/bundles/app-1.js",
            "sdk_version": "44.0.0",
            "revision_id": "rev-001",
            "name": "App One",
            "assets": [
                { "url": "https://host.example.com/assets/icon.png", "hash": "abc123" }
            ],
            "icon_url": "https://host.example.com/icon.png"
        }"#;
        let manifest = parse_manifest_str(input).expect("should parse");
        assert_eq!(manifest.scope_key.as_str(), "@user/app-1");
        assert_eq!(manifest.sdk_version.as_str(), "44.0.0");
        assert_eq!(manifest.assets.len(), 1);
        assert_eq!(manifest.name.as_deref(), Some("App One"));
        assert!(!manifest.is_development_mode());
        // Unknown fields survive in the extra map
        assert!(manifest.extra.contains_key("icon_url"));
    }

    #[test]
    fn parses_minimal_manifest() {
        let input = r#"{
            "scope_key": "@user/min",
            "bundle_url": "http://localhost:8081/index.bundle",
            "sdk_version": "UNVERSIONED"
        }"#;
        let manifest = parse_manifest_str(input).expect("should parse");
        assert!(manifest.revision_id.is_none());
        assert!(manifest.assets.is_empty());
        assert!(manifest.extra.is_empty());
    }

    #[test]
    fn development_manifest_is_detected() {
        let input = r#"{
            "scope_key": "@user/dev",
            "bundle_url": "http://192.168.1.5:8081/index.bundle",
            "sdk_version": "UNVERSIONED",
            "developer": { "tool": "gantry-devserver", "project_root": "/home/me/app" }
        }"#;
        let manifest = parse_manifest_str(input).unwrap();
        assert!(manifest.is_development_mode());
        assert_eq!(manifest.developer.unwrap().tool, "gantry-devserver");
    }

    #[test]
    fn rejects_empty_scope_key() {
        let input = r#"{
            "scope_key": "",
            "bundle_url": "https://host/app.js",
            "sdk_version": "44.0.0"
        }"#;
        assert!(matches!(
            parse_manifest_str(input),
            Err(ManifestError::EmptyScopeKey)
        ));
    }

    #[test]
    fn rejects_non_http_bundle_url() {
        let input = r#"{
            "scope_key": "@user/app",
            "bundle_url": "ftp://host/app.js",
            "sdk_version": "44.0.0"
        }"#;
        assert!(matches!(
            parse_manifest_str(input),
            Err(ManifestError::InvalidBundleUrl(_))
        ));
    }

    #[test]
    fn rejects_malformed_sdk_version() {
        for bad in ["44", "44.1.0", "44.0.0.0", "latest", ""] {
            let input = format!(
                r#"{{"scope_key": "@u/a", "bundle_url": "https://h/a.js", "sdk_version": "{bad}"}}"#
            );
            assert!(
                matches!(
                    parse_manifest_str(&input),
                    Err(ManifestError::InvalidSdkVersion(_))
                ),
                "'{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn unversioned_sdk_is_accepted() {
        assert!(validate_sdk_version("UNVERSIONED").is_ok());
        assert!(validate_sdk_version("44.0.0").is_ok());
        assert!(validate_sdk_version("9.0.0").is_ok());
    }

    #[test]
    fn rejects_missing_bundle_url() {
        let input = r#"{ "scope_key": "@user/app", "sdk_version": "44.0.0" }"#;
        assert!(parse_manifest_str(input).is_err());
    }

    #[test]
    fn serde_roundtrip_preserves_extra() {
        let input = r#"{
            "scope_key": "@user/app",
            "bundle_url": "https://host/app.js",
            "sdk_version": "44.0.0",
            "orientation": "portrait"
        }"#;
        let manifest = parse_manifest_str(input).unwrap();
        let json = serde_json::to_string(&manifest).unwrap();
        let back = parse_manifest_str(&json).unwrap();
        assert_eq!(back, manifest);
        assert_eq!(
            back.extra.get("orientation").and_then(Value::as_str),
            Some("portrait")
        );
    }
}
