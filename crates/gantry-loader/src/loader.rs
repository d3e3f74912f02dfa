use crate::development::DevelopmentModeFetcher;
use crate::fetcher::{
    AppFetcher, AttemptToken, CacheOnlyFetcher, EventSink, FetchEnvelope, FetchEvent, FetchOutcome,
};
use crate::lifecycle::{validate_transition, LoadState};
use crate::progress::LoadingProgress;
use crate::resolver::ManifestResolver;
use crate::LoaderError;
use gantry_cache::BundleCache;
use gantry_schema::Manifest;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Consumer of load results — the rendering host in a full shell.
pub trait AppHost {
    fn on_ready(&mut self, manifest: &Manifest, bundle: &[u8]);
    fn on_failed(&mut self, error: &LoaderError);
}

/// Optional observer of development-mode download progress.
pub trait ProgressListener {
    fn on_load_progress(&mut self, progress: &LoadingProgress);
}

/// How the loader picks a fetch strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Always load from the local cache (offline-tolerant published mode).
    Published,
    /// Always fetch live from the development server.
    Development,
    /// Decide per manifest: development mode iff the manifest declares a
    /// developer origin.
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    CacheOnly,
    DevelopmentMode,
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::CacheOnly => write!(f, "cache-only"),
            FetchStrategy::DevelopmentMode => write!(f, "development-mode"),
        }
    }
}

/// Pick the strategy for a manifest. The strategies themselves are oblivious
/// to why they were chosen.
pub fn select_strategy(manifest: &Manifest, mode: LoadMode) -> FetchStrategy {
    match mode {
        LoadMode::Published => FetchStrategy::CacheOnly,
        LoadMode::Development => FetchStrategy::DevelopmentMode,
        LoadMode::Auto => {
            if manifest.is_development_mode() {
                FetchStrategy::DevelopmentMode
            } else {
                FetchStrategy::CacheOnly
            }
        }
    }
}

/// Orchestrator owning the active fetch attempt.
///
/// A load request resolves a manifest, selects a strategy, and starts a
/// fresh fetcher under a new attempt token. Fetchers report back through an
/// event queue that the loader drains on its own context; envelopes whose
/// token is no longer current belong to a superseded attempt and are
/// discarded, so a replaced fetcher can never reach the host.
pub struct AppLoader {
    resolver: Box<dyn ManifestResolver>,
    cache: Arc<dyn BundleCache>,
    mode: LoadMode,
    state: LoadState,
    fetcher: Option<Box<dyn AppFetcher>>,
    attempt_counter: u64,
    events_tx: EventSink,
    events_rx: Receiver<FetchEnvelope>,
    progress_listener: Option<Box<dyn ProgressListener>>,
}

impl AppLoader {
    pub fn new(
        resolver: Box<dyn ManifestResolver>,
        cache: Arc<dyn BundleCache>,
        mode: LoadMode,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            resolver,
            cache,
            mode,
            state: LoadState::Idle,
            fetcher: None,
            attempt_counter: 0,
            events_tx,
            events_rx,
            progress_listener: None,
        }
    }

    pub fn set_progress_listener(&mut self, listener: Box<dyn ProgressListener>) {
        self.progress_listener = Some(listener);
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Manifest of the active fetcher, if a fetch has been started.
    pub fn current_manifest(&self) -> Option<&Manifest> {
        self.fetcher.as_deref().map(|f| f.manifest())
    }

    /// Outcome recorded on the active fetcher.
    pub fn current_outcome(&self) -> Option<&FetchOutcome> {
        self.fetcher.as_deref().map(|f| f.outcome())
    }

    fn transition(&mut self, to: LoadState) -> Result<(), LoaderError> {
        validate_transition(self.state, to)?;
        debug!("load state {} -> {to}", self.state);
        self.state = to;
        Ok(())
    }

    fn next_attempt(&mut self) -> AttemptToken {
        self.attempt_counter += 1;
        AttemptToken::new(self.attempt_counter)
    }

    fn current_attempt(&self) -> AttemptToken {
        AttemptToken::new(self.attempt_counter)
    }

    /// Begin loading the app at `url`, replacing any active fetch.
    ///
    /// Load failures — manifest resolution, cache miss, transport — reach
    /// the consumer through [`AppHost::on_failed`]; `Err` here means the
    /// request itself was ill-formed.
    pub fn request_load(
        &mut self,
        url: &str,
        host: &mut dyn AppHost,
    ) -> Result<(), LoaderError> {
        self.transition(LoadState::Resolving)?;
        // Abandon the previous fetcher; its late events fail the token check.
        self.fetcher = None;

        info!("resolving manifest from {url}");
        match self.resolver.resolve(url) {
            Ok(manifest) => self.start_fetch(manifest),
            Err(error) => {
                self.transition(LoadState::Failed)?;
                host.on_failed(&error);
                Ok(())
            }
        }
    }

    fn start_fetch(&mut self, manifest: Manifest) -> Result<(), LoaderError> {
        let strategy = select_strategy(&manifest, self.mode);
        info!("starting {strategy} fetch for {}", manifest.scope_key);
        self.transition(LoadState::Fetching)?;

        let mut fetcher: Box<dyn AppFetcher> = match strategy {
            FetchStrategy::CacheOnly => Box::new(CacheOnlyFetcher::new(
                manifest,
                Arc::clone(&self.cache),
            )),
            FetchStrategy::DevelopmentMode => Box::new(DevelopmentModeFetcher::new(manifest)),
        };

        let attempt = self.next_attempt();
        fetcher.start(attempt, &self.events_tx);
        self.fetcher = Some(fetcher);
        Ok(())
    }

    /// Restart the active fetch against the same manifest (development mode
    /// only). Any in-flight attempt is cancelled and its events discarded.
    pub fn force_reload(&mut self) -> Result<(), LoaderError> {
        match self.fetcher.as_deref() {
            None => return Err(LoaderError::NoActiveLoad),
            Some(fetcher) if !fetcher.supports_reload() => {
                return Err(LoaderError::ReloadUnsupported);
            }
            Some(_) => {}
        }

        self.transition(LoadState::Fetching)?;
        let attempt = self.next_attempt();
        let sink = self.events_tx.clone();
        if let Some(fetcher) = self.fetcher.as_mut() {
            fetcher.force_reload(attempt, &sink)?;
        }
        Ok(())
    }

    /// Drain all queued events without blocking. Returns the number of
    /// events delivered to the consumer (discarded stale events not counted).
    pub fn pump(&mut self, host: &mut dyn AppHost) -> usize {
        let mut delivered = 0;
        while let Ok(envelope) = self.events_rx.try_recv() {
            if self.deliver(envelope, host) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Drain events until the load settles or the timeout passes. Returns
    /// true when a terminal state was reached.
    pub fn pump_until_terminal(&mut self, host: &mut dyn AppHost, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.state.is_terminal() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.events_rx.recv_timeout(remaining) {
                Ok(envelope) => {
                    self.deliver(envelope, host);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    fn deliver(&mut self, envelope: FetchEnvelope, host: &mut dyn AppHost) -> bool {
        if envelope.attempt != self.current_attempt() {
            debug!(
                "discarding event from superseded attempt {}",
                envelope.attempt.value()
            );
            return false;
        }
        let Some(fetcher) = self.fetcher.as_mut() else {
            return false;
        };

        match envelope.event {
            FetchEvent::Progress(progress) => {
                if let Some(listener) = self.progress_listener.as_mut() {
                    listener.on_load_progress(&progress);
                }
                true
            }
            FetchEvent::Ready(bundle) => {
                if let Err(e) = validate_transition(self.state, LoadState::Delivered) {
                    warn!("dropping terminal event: {e}");
                    return false;
                }
                self.state = LoadState::Delivered;
                fetcher.record_outcome(FetchOutcome::Ready { bundle });
                if let FetchOutcome::Ready { bundle } = fetcher.outcome() {
                    host.on_ready(fetcher.manifest(), bundle);
                }
                true
            }
            FetchEvent::Failed(error) => {
                if let Err(e) = validate_transition(self.state, LoadState::Failed) {
                    warn!("dropping terminal event: {e}");
                    return false;
                }
                self.state = LoadState::Failed;
                fetcher.record_outcome(FetchOutcome::Failed { error });
                if let FetchOutcome::Failed { error } = fetcher.outcome() {
                    host.on_failed(error);
                }
                true
            }
        }
    }
}
