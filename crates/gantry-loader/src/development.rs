use crate::fetcher::{emit, AppFetcher, AttemptToken, EventSink, FetchEvent, FetchOutcome};
use crate::progress::LoadingProgress;
use crate::LoaderError;
use gantry_schema::Manifest;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;
const DOWNLOAD_STATUS: &str = "downloading bundle";

/// Strategy that fetches a live bundle from a development server.
///
/// Each attempt runs on its own worker thread, streaming the response body
/// and emitting monotonically increasing progress. `force_reload` aborts the
/// in-flight worker and starts a fresh attempt against the same manifest, so
/// at most one request per instance is in flight at any time.
pub struct DevelopmentModeFetcher {
    manifest: Manifest,
    outcome: FetchOutcome,
    /// Abort flag of the in-flight attempt, if any.
    abort: Option<Arc<AtomicBool>>,
}

impl DevelopmentModeFetcher {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            outcome: FetchOutcome::InFlight,
            abort: None,
        }
    }

    fn spawn_attempt(&mut self, attempt: AttemptToken, events: &EventSink) {
        let abort = Arc::new(AtomicBool::new(false));
        self.abort = Some(Arc::clone(&abort));

        let url = self.manifest.bundle_url.clone();
        let events = events.clone();
        std::thread::spawn(move || {
            debug!("development fetch of {url}");
            match download(&url, &abort, &events, attempt) {
                Ok(bundle) => emit(&events, attempt, FetchEvent::Ready(bundle)),
                Err(DownloadEnd::Aborted) => {
                    debug!("development fetch of {url} aborted");
                }
                Err(DownloadEnd::Transport(msg)) => {
                    emit(&events, attempt, FetchEvent::Failed(LoaderError::Transport(msg)));
                }
            }
        });
    }
}

enum DownloadEnd {
    Aborted,
    Transport(String),
}

fn download(
    url: &str,
    abort: &AtomicBool,
    events: &EventSink,
    attempt: AttemptToken,
) -> Result<Vec<u8>, DownloadEnd> {
    let agent = ureq::Agent::new_with_defaults();
    let resp = match agent.get(url).call() {
        Ok(r) => r,
        Err(ureq::Error::StatusCode(code)) => {
            return Err(DownloadEnd::Transport(format!("HTTP {code} for {url}")));
        }
        Err(e) => return Err(DownloadEnd::Transport(e.to_string())),
    };

    let total = resp
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    // Zero progress up front so consumers can show a bar before bytes arrive.
    emit(
        events,
        attempt,
        FetchEvent::Progress(LoadingProgress::new(0, total).with_status(DOWNLOAD_STATUS)),
    );

    let mut reader = resp.into_body().into_reader();
    let mut bundle = Vec::new();
    let mut chunk = vec![0u8; DOWNLOAD_CHUNK_SIZE];
    loop {
        if abort.load(Ordering::SeqCst) {
            return Err(DownloadEnd::Aborted);
        }
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                bundle.extend_from_slice(&chunk[..n]);
                emit(
                    events,
                    attempt,
                    FetchEvent::Progress(
                        LoadingProgress::new(bundle.len() as u64, total)
                            .with_status(DOWNLOAD_STATUS),
                    ),
                );
            }
            Err(e) => return Err(DownloadEnd::Transport(e.to_string())),
        }
    }

    Ok(bundle)
}

impl AppFetcher for DevelopmentModeFetcher {
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
        self.spawn_attempt(attempt, events);
    }

    fn supports_reload(&self) -> bool {
        true
    }

    fn force_reload(
        &mut self,
        attempt: AttemptToken,
        events: &EventSink,
    ) -> Result<(), LoaderError> {
        // Abort the previous worker; its late events are additionally
        // filtered out by attempt token on the loader side.
        if let Some(abort) = self.abort.take() {
            abort.store(true, Ordering::SeqCst);
        }
        self.outcome = FetchOutcome::InFlight;
        self.spawn_attempt(attempt, events);
        Ok(())
    }
}
