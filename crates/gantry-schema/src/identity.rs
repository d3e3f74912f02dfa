use crate::manifest::Manifest;
use crate::types::BundleKey;

/// Compute the cache identity of a manifest's bundle.
///
/// The key is derived from the fields that pin a bundle's content: scope key,
/// SDK version, and the revision id when the publishing service supplied one.
/// Manifests differing only in display metadata (name, assets, extra fields)
/// map to the same key, so a re-resolved manifest still hits the cache.
pub fn compute_bundle_key(manifest: &Manifest) -> BundleKey {
    let mut hasher = blake3::Hasher::new();

    hasher.update(format!("scope:{}", manifest.scope_key).as_bytes());
    hasher.update(format!("sdk:{}", manifest.sdk_version).as_bytes());
    if let Some(revision) = &manifest.revision_id {
        hasher.update(format!("rev:{revision}").as_bytes());
    }

    BundleKey::new(hasher.finalize().to_hex().to_string())
}
