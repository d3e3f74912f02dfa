use super::{json_pretty, open_cache, EXIT_SUCCESS};
use gantry_cache::BundleCache;
use std::path::Path;

pub fn run(cache_path: &Path, json: bool) -> Result<u8, String> {
    let cache = open_cache(cache_path)?;
    let keys = cache.list().map_err(|e| format!("cache error: {e}"))?;

    if json {
        let records: Vec<_> = keys
            .iter()
            .filter_map(|k| cache.record(k).ok())
            .collect();
        println!("{}", json_pretty(&records)?);
    } else if keys.is_empty() {
        println!("cache is empty");
    } else {
        println!("{:<14} {:>12} {:<26} KEY", "SHORT", "BYTES", "STORED_AT");
        for key in &keys {
            match cache.record(key) {
                Ok(record) => println!(
                    "{:<14} {:>12} {:<26} {}",
                    key.short(),
                    record.size,
                    record.stored_at,
                    key
                ),
                Err(_) => println!("{:<14} {:>12} {:<26} {}", key.short(), "?", "?", key),
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
