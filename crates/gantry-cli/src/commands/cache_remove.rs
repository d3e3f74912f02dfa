use super::{open_cache, EXIT_SUCCESS};
use gantry_cache::{BundleCache, CacheLock, DiskBundleCache};
use gantry_schema::BundleKey;
use std::path::Path;

/// Resolve a full key or unique prefix against the cached keys.
fn resolve_key(cache: &DiskBundleCache, input: &str) -> Result<BundleKey, String> {
    let keys = cache.list().map_err(|e| format!("cache error: {e}"))?;

    if let Some(exact) = keys.iter().find(|k| k.as_str() == input) {
        return Ok(exact.clone());
    }

    let matches: Vec<_> = keys.iter().filter(|k| k.starts_with(input)).collect();
    match matches.len() {
        0 => Err(format!("no cached bundle matching '{input}'")),
        1 => Ok(matches[0].clone()),
        n => Err(format!(
            "ambiguous key prefix '{input}': matches {n} bundles"
        )),
    }
}

pub fn run(cache_path: &Path, key: &str) -> Result<u8, String> {
    let cache = open_cache(cache_path)?;
    let resolved = resolve_key(&cache, key)?;

    let _lock = CacheLock::acquire(&cache.layout().lock_file())
        .map_err(|e| format!("cache lock: {e}"))?;
    cache
        .remove(&resolved)
        .map_err(|e| format!("cache error: {e}"))?;

    println!("removed {}", resolved.short());
    Ok(EXIT_SUCCESS)
}
