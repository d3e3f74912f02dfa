use super::{json_pretty, open_cache, EXIT_CACHE_ERROR, EXIT_SUCCESS};
use gantry_cache::verify_cache_integrity;
use std::path::Path;

pub fn run(cache_path: &Path, json: bool) -> Result<u8, String> {
    let cache = open_cache(cache_path)?;
    let report = verify_cache_integrity(&cache).map_err(|e| format!("cache error: {e}"))?;

    if json {
        let payload = serde_json::json!({
            "checked": report.checked,
            "passed": report.passed,
            "failed": report.failed.len(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "cache integrity: {}/{} bundles passed",
            report.passed, report.checked
        );
        for f in &report.failed {
            println!("  FAIL {}: {}", f.key, f.reason);
        }
    }

    if report.is_clean() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_CACHE_ERROR)
    }
}
