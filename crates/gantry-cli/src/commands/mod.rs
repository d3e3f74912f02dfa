pub mod cache_list;
pub mod cache_remove;
pub mod cache_verify;
pub mod completions;
pub mod inspect;
pub mod load;

use gantry_cache::DiskBundleCache;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_CACHE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

/// Byte-count bar for bundle downloads; switches to a spinner style when the
/// server did not announce a length.
pub fn download_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {bytes}/{total_bytes}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn colorize_state(state: &str) -> String {
    use console::Style;
    match state {
        "delivered" => Style::new().green().apply_to(state).to_string(),
        "fetching" | "resolving" => Style::new().cyan().apply_to(state).to_string(),
        "failed" => Style::new().red().apply_to(state).to_string(),
        "idle" => Style::new().dim().apply_to(state).to_string(),
        other => other.to_owned(),
    }
}

pub fn open_cache(cache_path: &Path) -> Result<DiskBundleCache, String> {
    DiskBundleCache::open(cache_path).map_err(|e| format!("cache error: {e}"))
}

static INTERRUPT_REQUESTED: AtomicBool = AtomicBool::new(false);

pub fn install_signal_handler() {
    let _ = ctrlc::set_handler(move || {
        if INTERRUPT_REQUESTED.load(Ordering::SeqCst) {
            std::process::exit(1);
        }
        INTERRUPT_REQUESTED.store(true, Ordering::SeqCst);
        eprintln!("\ninterrupt requested, abandoning load...");
    });
}

pub fn interrupt_requested() -> bool {
    INTERRUPT_REQUESTED.load(Ordering::SeqCst)
}
