//! Manifest model for Gantry: the value objects describing a remotely hosted
//! application, identifier newtypes, JSON parsing with validation, and the
//! derivation of a manifest's bundle cache key.

pub mod identity;
pub mod manifest;
pub mod types;

pub use identity::compute_bundle_key;
pub use manifest::{
    parse_manifest_file, parse_manifest_slice, parse_manifest_str, AssetEntry, DeveloperInfo,
    Manifest, ManifestError,
};
pub use types::{BundleKey, RevisionId, ScopeKey, SdkVersion};
