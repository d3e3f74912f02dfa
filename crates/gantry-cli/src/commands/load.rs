use super::{
    download_bar, interrupt_requested, json_pretty, open_cache, spin_fail, EXIT_SUCCESS,
};
use gantry_cache::{BundleCache, CacheLock};
use gantry_loader::{
    AppHost, AppLoader, HttpManifestResolver, LoadMode, LoaderError, LoadingProgress,
    ProgressListener,
};
use gantry_schema::{compute_bundle_key, Manifest};
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const PUMP_INTERVAL: Duration = Duration::from_millis(200);

/// Forwards fetch progress onto an indicatif bar.
struct BarListener {
    bar: ProgressBar,
    length_set: bool,
}

impl ProgressListener for BarListener {
    fn on_load_progress(&mut self, progress: &LoadingProgress) {
        if let Some(total) = progress.total {
            if !self.length_set {
                self.bar.set_length(total);
                self.length_set = true;
            }
        }
        if let Some(status) = &progress.status {
            self.bar.set_message(status.clone());
        }
        self.bar.set_position(progress.done);
    }
}

#[derive(Default)]
struct CaptureHost {
    ready: Option<(Manifest, Vec<u8>)>,
    failed: Option<String>,
}

impl AppHost for CaptureHost {
    fn on_ready(&mut self, manifest: &Manifest, bundle: &[u8]) {
        self.ready = Some((manifest.clone(), bundle.to_vec()));
    }

    fn on_failed(&mut self, error: &LoaderError) {
        self.failed = Some(error.to_string());
    }
}

pub fn run(
    url: &str,
    cache_path: &Path,
    mode: LoadMode,
    output: Option<&Path>,
    save: bool,
    json: bool,
) -> Result<u8, String> {
    let cache = Arc::new(open_cache(cache_path)?);
    let cache_reader: Arc<dyn BundleCache> = cache.clone();

    let mut loader = AppLoader::new(Box::new(HttpManifestResolver::new()), cache_reader, mode);

    let bar = if json { None } else { Some(download_bar()) };
    if let Some(bar) = &bar {
        loader.set_progress_listener(Box::new(BarListener {
            bar: bar.clone(),
            length_set: false,
        }));
    }

    let mut host = CaptureHost::default();
    loader
        .request_load(url, &mut host)
        .map_err(|e| e.to_string())?;

    loop {
        if loader.pump_until_terminal(&mut host, PUMP_INTERVAL) {
            break;
        }
        if interrupt_requested() {
            if let Some(bar) = &bar {
                spin_fail(bar, "load interrupted");
            }
            return Err("interrupted".to_owned());
        }
    }

    if let Some(msg) = host.failed {
        if let Some(bar) = &bar {
            spin_fail(bar, "load failed");
        }
        return Err(msg);
    }

    let Some((manifest, bundle)) = host.ready else {
        return Err("load settled without a result".to_owned());
    };
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let key = compute_bundle_key(&manifest);
    if save {
        let _lock = CacheLock::acquire(&cache.layout().lock_file())
            .map_err(|e| format!("cache lock: {e}"))?;
        cache
            .store(&key, &bundle)
            .map_err(|e| format!("cache error: {e}"))?;
    }
    if let Some(path) = output {
        std::fs::write(path, &bundle).map_err(|e| format!("failed to write bundle: {e}"))?;
    }

    if json {
        let payload = serde_json::json!({
            "scope_key": manifest.scope_key,
            "sdk_version": manifest.sdk_version,
            "bundle_key": key,
            "bundle_bytes": bundle.len(),
            "development_mode": manifest.is_development_mode(),
            "saved": save,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("loaded {} ({} bytes)", manifest.scope_key, bundle.len());
        println!("sdk_version: {}", manifest.sdk_version);
        println!("bundle_key:  {}", key.short());
        if save {
            println!("saved to cache");
        }
        if let Some(path) = output {
            println!("wrote {}", path.display());
        }
    }
    Ok(EXIT_SUCCESS)
}
