use super::{json_pretty, EXIT_SUCCESS};
use gantry_loader::{HttpManifestResolver, ManifestResolver};
use gantry_schema::compute_bundle_key;

pub fn run(url: &str, json: bool) -> Result<u8, String> {
    let resolver = HttpManifestResolver::new();
    let manifest = resolver.resolve(url).map_err(|e| e.to_string())?;
    let key = compute_bundle_key(&manifest);

    if json {
        println!("{}", json_pretty(&manifest)?);
    } else {
        println!("scope_key:    {}", manifest.scope_key);
        println!("sdk_version:  {}", manifest.sdk_version);
        println!("bundle_url:   {}", manifest.bundle_url);
        println!("bundle_key:   {}", key.short());
        println!(
            "name:         {}",
            manifest.name.as_deref().unwrap_or("(none)")
        );
        println!(
            "revision:     {}",
            manifest
                .revision_id
                .as_ref()
                .map_or("(none)", |r| r.as_str())
        );
        println!("assets:       {}", manifest.assets.len());
        match &manifest.developer {
            Some(dev) => println!("developer:    {}", dev.tool),
            None => println!("developer:    (published)"),
        }
    }
    Ok(EXIT_SUCCESS)
}
