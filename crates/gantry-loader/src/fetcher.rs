use crate::progress::LoadingProgress;
use crate::LoaderError;
use gantry_cache::BundleCache;
use gantry_schema::{compute_bundle_key, Manifest};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::debug;

/// Token identifying one fetch attempt. The loader issues a fresh token per
/// attempt and compares it at delivery time, so events from a superseded
/// attempt never reach the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptToken(u64);

impl AttemptToken {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// A notification emitted by a fetch strategy.
#[derive(Debug)]
pub enum FetchEvent {
    Progress(LoadingProgress),
    Ready(Vec<u8>),
    Failed(LoaderError),
}

/// A [`FetchEvent`] tagged with the attempt that produced it.
#[derive(Debug)]
pub struct FetchEnvelope {
    pub attempt: AttemptToken,
    pub event: FetchEvent,
}

/// Sending half of the loader's event queue, handed to fetch strategies.
///
/// This is the fetcher's only reference back to its owning loader: it cannot
/// extend the loader's lifetime, and a send into a torn-down queue is simply
/// ignored.
pub type EventSink = Sender<FetchEnvelope>;

pub(crate) fn emit(events: &EventSink, attempt: AttemptToken, event: FetchEvent) {
    // The receiving loader may already be gone; late events are dropped.
    let _ = events.send(FetchEnvelope { attempt, event });
}

/// Terminal state of a fetch attempt. `InFlight` while neither a bundle nor
/// an error has been produced; afterwards exactly one of the two.
#[derive(Debug, Default)]
pub enum FetchOutcome {
    #[default]
    InFlight,
    Ready {
        bundle: Vec<u8>,
    },
    Failed {
        error: LoaderError,
    },
}

impl FetchOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FetchOutcome::InFlight)
    }

    pub fn bundle(&self) -> Option<&[u8]> {
        match self {
            FetchOutcome::Ready { bundle } => Some(bundle),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LoaderError> {
        match self {
            FetchOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Contract every fetch strategy satisfies: own a manifest, produce exactly
/// one terminal event per attempt (after zero or more progress events), and
/// expose the recorded outcome.
pub trait AppFetcher: Send {
    fn manifest(&self) -> &Manifest;

    fn outcome(&self) -> &FetchOutcome;

    /// Record the terminal outcome. Called by the owning loader while
    /// delivering this fetcher's terminal event — never by the fetcher
    /// itself, so an abandoned attempt leaves the outcome untouched.
    fn record_outcome(&mut self, outcome: FetchOutcome);

    /// Begin strategy-specific work. Must be invoked at most once per
    /// instance; the orchestrator enforces this by constructing a fresh
    /// fetcher per load request.
    fn start(&mut self, attempt: AttemptToken, events: &EventSink);

    fn supports_reload(&self) -> bool {
        false
    }

    /// Cancel any in-flight attempt and start a new one against the same
    /// manifest. Strategies without reload support report
    /// [`LoaderError::ReloadUnsupported`].
    fn force_reload(
        &mut self,
        attempt: AttemptToken,
        events: &EventSink,
    ) -> Result<(), LoaderError> {
        let _ = (attempt, events);
        Err(LoaderError::ReloadUnsupported)
    }
}

/// Strategy that resolves a bundle strictly from the local cache.
///
/// The lookup is synchronous and emits no progress events; a missing entry
/// is a terminal `CacheMiss`. Falling back to the network is the caller's
/// decision, made by issuing a new load with a different strategy.
pub struct CacheOnlyFetcher {
    manifest: Manifest,
    cache: Arc<dyn BundleCache>,
    outcome: FetchOutcome,
}

impl CacheOnlyFetcher {
    pub fn new(manifest: Manifest, cache: Arc<dyn BundleCache>) -> Self {
        Self {
            manifest,
            cache,
            outcome: FetchOutcome::InFlight,
        }
    }
}

impl AppFetcher for CacheOnlyFetcher {
    fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn outcome(&self) -> &FetchOutcome {
        &self.outcome
    }

    fn record_outcome(&mut self, outcome: FetchOutcome) {
        self.outcome = outcome;
    }

    fn start(&mut self, attempt: AttemptToken, events: &EventSink) {
        let key = compute_bundle_key(&self.manifest);
        let event = match self.cache.lookup(&key) {
            Ok(Some(bundle)) => {
                debug!("cache-only fetch hit {} for {}", key.short(), self.manifest.scope_key);
                FetchEvent::Ready(bundle)
            }
            Ok(None) => {
                debug!("cache-only fetch miss {} for {}", key.short(), self.manifest.scope_key);
                FetchEvent::Failed(LoaderError::CacheMiss(key))
            }
            Err(e) => FetchEvent::Failed(LoaderError::Cache(e)),
        };
        emit(events, attempt, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_cache::MemoryBundleCache;
    use gantry_schema::parse_manifest_str;
    use std::sync::mpsc;

    fn manifest(scope: &str) -> Manifest {
        parse_manifest_str(&format!(
            r#"{{"scope_key": "{scope}", "bundle_url": "https://h/a.js", "sdk_version": "44.0.0"}}"#
        ))
        .unwrap()
    }

    #[test]
    fn outcome_starts_in_flight() {
        let outcome = FetchOutcome::default();
        assert!(!outcome.is_terminal());
        assert!(outcome.bundle().is_none());
        assert!(outcome.error().is_none());
    }

    #[test]
    fn terminal_outcome_holds_exactly_one_side() {
        let ready = FetchOutcome::Ready { bundle: vec![1, 2] };
        assert!(ready.is_terminal());
        assert!(ready.bundle().is_some());
        assert!(ready.error().is_none());

        let failed = FetchOutcome::Failed {
            error: LoaderError::Transport("down".to_owned()),
        };
        assert!(failed.is_terminal());
        assert!(failed.bundle().is_none());
        assert!(failed.error().is_some());
    }

    #[test]
    fn cache_hit_emits_single_ready_event() {
        let cache = Arc::new(MemoryBundleCache::new());
        let m = manifest("@user/app");
        cache
            .store(&compute_bundle_key(&m), b"bundle bytes")
            .unwrap();

        let (tx, rx) = mpsc::channel();
        let mut fetcher = CacheOnlyFetcher::new(m, cache);
        fetcher.start(AttemptToken::new(1), &tx);

        let envelope = rx.try_recv().unwrap();
        assert_eq!(envelope.attempt, AttemptToken::new(1));
        assert!(matches!(envelope.event, FetchEvent::Ready(ref b) if b == b"bundle bytes"));
        // cache lookup is instantaneous: no progress, no further events
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cache_miss_emits_single_failed_event() {
        let cache = Arc::new(MemoryBundleCache::new());
        let m = manifest("app-1");
        let key = compute_bundle_key(&m);

        let (tx, rx) = mpsc::channel();
        let mut fetcher = CacheOnlyFetcher::new(m, cache);
        fetcher.start(AttemptToken::new(1), &tx);

        let envelope = rx.try_recv().unwrap();
        match envelope.event {
            FetchEvent::Failed(LoaderError::CacheMiss(missed)) => assert_eq!(missed, key),
            other => panic!("expected CacheMiss, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cache_only_does_not_support_reload() {
        let cache = Arc::new(MemoryBundleCache::new());
        let mut fetcher = CacheOnlyFetcher::new(manifest("@user/app"), cache);
        assert!(!fetcher.supports_reload());

        let (tx, _rx) = mpsc::channel();
        assert!(matches!(
            fetcher.force_reload(AttemptToken::new(2), &tx),
            Err(LoaderError::ReloadUnsupported)
        ));
    }

    #[test]
    fn emit_into_dropped_queue_is_ignored() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        // Must not panic: the loader side is gone.
        emit(
            &tx,
            AttemptToken::new(7),
            FetchEvent::Progress(LoadingProgress::new(0, None)),
        );
    }
}
