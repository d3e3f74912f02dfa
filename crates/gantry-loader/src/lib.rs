//! App-load orchestration for Gantry.
//!
//! This crate implements the manifest-resolution-and-bundle-fetch state
//! machine: the [`AppFetcher`] contract with its cache-only and
//! development-mode strategies, the [`AppLoader`] orchestrator that selects a
//! strategy, discards callbacks from superseded fetch attempts, and delivers
//! the finished (manifest, bundle) pair to a rendering host, plus the
//! [`ManifestResolver`] used to turn a URL into a [`Manifest`].
//!
//! [`Manifest`]: gantry_schema::Manifest

pub mod config;
pub mod development;
pub mod fetcher;
pub mod lifecycle;
pub mod loader;
pub mod progress;
pub mod resolver;

pub use config::ClientConfig;
pub use development::DevelopmentModeFetcher;
pub use fetcher::{
    AppFetcher, AttemptToken, CacheOnlyFetcher, EventSink, FetchEnvelope, FetchEvent, FetchOutcome,
};
pub use lifecycle::{validate_transition, LoadState};
pub use loader::{select_strategy, AppHost, AppLoader, FetchStrategy, LoadMode, ProgressListener};
pub use progress::LoadingProgress;
pub use resolver::{normalize_manifest_url, HttpManifestResolver, ManifestResolver};

use gantry_cache::CacheError;
use gantry_schema::{BundleKey, ManifestError};
use thiserror::Error;

/// Protocol version sent as `X-Gantry-Protocol` header on manifest and
/// bundle requests. Servers can reject clients with incompatible versions.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("no cached bundle for {0}")]
    CacheMiss(BundleKey),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("manifest resolution failed: {0}")]
    ManifestResolution(String),
    #[error("active fetch strategy does not support reload")]
    ReloadUnsupported,
    #[error("no load in progress")]
    NoActiveLoad,
    #[error("invalid load state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_miss_names_the_key() {
        let e = LoaderError::CacheMiss(BundleKey::new("abc123"));
        assert!(e.to_string().contains("abc123"));
    }

    #[test]
    fn transport_error_display() {
        let e = LoaderError::Transport("connection refused".to_owned());
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn cache_error_converts() {
        let e: LoaderError = CacheError::BundleNotFound("k".to_owned()).into();
        assert!(matches!(e, LoaderError::Cache(_)));
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let e = LoaderError::InvalidTransition {
            from: "idle".to_owned(),
            to: "delivered".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("idle"));
        assert!(msg.contains("delivered"));
    }
}
