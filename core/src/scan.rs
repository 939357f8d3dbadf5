//! Scan orchestration: the state machine tying capture, simulated progress,
//! the identification call and outcome reconciliation together.
//!
//! One scan attempt moves through `Idle -> Capturing ->
//! AwaitingIdentification -> Reconciling -> Settled | Failed`. The progress
//! simulator runs as a spawned task concurrently with the real network call
//! and is always stopped, and driven to 100, strictly before the phase
//! leaves `Reconciling`. The reconciliation decision table lives in
//! [`reconcile`] as a pure function so the trust boundary it encodes stays
//! auditable in isolation.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::debug;
use tracing::warn;

use crate::capture::CaptureSource;
use crate::capture::CapturedImage;
use crate::catalog::FallbackCatalog;
use crate::credential::Credential;
use crate::identify::IdentificationOutcome;
use crate::identify::IdentifyClient;
use crate::identify::IdentifyFailure;
use crate::progress;
use crate::progress::ProgressHandle;
use crate::progress::ProgressSimulator;

/// Stand-in for scan work when no live capture source is available.
pub const DEMO_SCAN_DELAY: Duration = Duration::from_millis(2000);
/// Pause after progress reaches 100 so the completed bar can render before
/// the view transitions.
pub const SETTLE_DELAY: Duration = Duration::from_millis(400);

pub const KEY_MISSING_MESSAGE: &str =
    "Auto-injection failed: Key is missing. Add a Gemini API key to identify real products.";
pub const KEY_INVALID_MESSAGE: &str =
    "Auto-injected key is invalid. Replace it with a valid Gemini API key.";

/// What the user can do about a failed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Guide the user to provide a credential instead of showing raw detail.
    ConfigureCredential,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// The frame captured during this attempt, re-tagged for display.
    Captured(CapturedImage),
    CatalogAsset(&'static str),
}

/// The entity ultimately displayed. `ai_powered` is true only when the
/// result was derived from a real identification success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub name: String,
    pub brand: String,
    pub price: String,
    pub confidence: String,
    pub image: ImageRef,
    pub ai_powered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Capturing,
    AwaitingIdentification,
    Reconciling,
    Settled(ScanResult),
    Failed {
        message: String,
        remediation: Remediation,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("a scan attempt is already in flight")]
    ScanInFlight,
}

pub struct ScanOrchestrator {
    client: IdentifyClient,
    catalog: FallbackCatalog,
    phase_tx: watch::Sender<ScanPhase>,
    progress_tx: Arc<watch::Sender<u8>>,
    ticker: Mutex<Option<(u64, ProgressHandle)>>,
    in_flight: AtomicBool,
    generation: AtomicU64,
}

impl ScanOrchestrator {
    pub fn new(client: IdentifyClient) -> Self {
        let (phase_tx, _) = watch::channel(ScanPhase::Idle);
        let (progress_tx, _) = watch::channel(0u8);
        Self {
            client,
            catalog: FallbackCatalog,
            phase_tx,
            progress_tx: Arc::new(progress_tx),
            ticker: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Feed of phase transitions for the presentation layer.
    pub fn phases(&self) -> watch::Receiver<ScanPhase> {
        self.phase_tx.subscribe()
    }

    /// Feed of the simulated progress percentage (0..=100).
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress_tx.subscribe()
    }

    pub fn is_scanning(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Abandons any in-flight attempt and returns to `Idle`. The attempt's
    /// network call is not aborted, but its result is discarded: a stale
    /// completion publishes no further phase transition.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        // Whatever handle is stored belongs to a now-stale generation.
        if let Some((_, ticker)) = self.take_any_ticker() {
            ticker.abort();
        }
        self.in_flight.store(false, Ordering::SeqCst);
        self.progress_tx.send_replace(0);
        self.phase_tx.send_replace(ScanPhase::Idle);
    }

    /// Runs one scan attempt to its terminal phase.
    ///
    /// At most one attempt may be active at a time; a second call while one
    /// is in flight fails with [`ScanError::ScanInFlight`]. The returned
    /// phase is always `Settled` or `Failed`.
    pub async fn run_scan(
        &self,
        source: &dyn CaptureSource,
        credential: Option<Credential>,
    ) -> Result<ScanPhase, ScanError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(ScanError::ScanInFlight);
        }
        let generation = self.generation.load(Ordering::SeqCst);
        let terminal = self.drive_scan(source, credential, generation).await;
        if self.generation.load(Ordering::SeqCst) == generation {
            self.phase_tx.send_replace(terminal.clone());
            self.in_flight.store(false, Ordering::SeqCst);
        } else {
            debug!("scan attempt was reset mid-flight, discarding its result");
        }
        Ok(terminal)
    }

    async fn drive_scan(
        &self,
        source: &dyn CaptureSource,
        credential: Option<Credential>,
        generation: u64,
    ) -> ScanPhase {
        self.progress_tx.send_replace(0);
        self.emit(generation, ScanPhase::Capturing);
        self.store_ticker(generation, ProgressSimulator::start(Arc::clone(&self.progress_tx)));

        let attempt = if source.has_live_capture() {
            match source.capture_frame().await {
                Ok(image) => {
                    self.emit(generation, ScanPhase::AwaitingIdentification);
                    let outcome = self.client.identify(&image, credential.as_ref()).await;
                    Some((image, outcome))
                }
                Err(err) => {
                    // A source that loses its frame mid-attempt degrades to
                    // the demo path rather than surfacing a capture error.
                    warn!("frame capture failed, continuing without identification: {err}");
                    self.emit(generation, ScanPhase::AwaitingIdentification);
                    sleep(DEMO_SCAN_DELAY).await;
                    None
                }
            }
        } else {
            self.emit(generation, ScanPhase::AwaitingIdentification);
            sleep(DEMO_SCAN_DELAY).await;
            None
        };

        // Ticking has fully stopped before the displayed value is driven to
        // completion, and completion renders before the view switches. Only
        // this attempt's own handle may be taken: after a reset the slot can
        // already hold the simulator of a newer attempt.
        if let Some(ticker) = self.take_ticker(generation) {
            ticker.stop().await;
        }
        if self.generation.load(Ordering::SeqCst) == generation {
            self.progress_tx.send_replace(progress::COMPLETE);
        }
        sleep(SETTLE_DELAY).await;
        self.emit(generation, ScanPhase::Reconciling);

        let user_supplied = credential
            .as_ref()
            .is_some_and(Credential::is_user_supplied);
        reconcile(attempt, user_supplied, &self.catalog)
    }

    fn emit(&self, generation: u64, phase: ScanPhase) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        self.phase_tx.send_replace(phase);
    }

    fn store_ticker(&self, generation: u64, handle: ProgressHandle) {
        if let Ok(mut slot) = self.ticker.lock() {
            *slot = Some((generation, handle));
        }
    }

    /// Takes the stored handle only if it belongs to `generation`.
    fn take_ticker(&self, generation: u64) -> Option<ProgressHandle> {
        let mut slot = self.ticker.lock().ok()?;
        match slot.take() {
            Some((owner, handle)) if owner == generation => Some(handle),
            other => {
                *slot = other;
                None
            }
        }
    }

    fn take_any_ticker(&self) -> Option<(u64, ProgressHandle)> {
        self.ticker.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Decision table mapping one identification attempt onto its terminal
/// phase. `attempt` is `None` when no live capture was available (demo mode).
///
/// Silent substitution of a catalog sample is only acceptable when the user
/// never opted into a credential of their own; under a user-supplied
/// credential, failures are surfaced verbatim.
pub fn reconcile(
    attempt: Option<(CapturedImage, IdentificationOutcome)>,
    credential_user_supplied: bool,
    catalog: &FallbackCatalog,
) -> ScanPhase {
    match (attempt, credential_user_supplied) {
        (Some((image, IdentificationOutcome::Success(product))), _) => {
            ScanPhase::Settled(ScanResult {
                name: product.name,
                brand: product.brand,
                price: product.price,
                confidence: product.confidence,
                image: ImageRef::Captured(image.into_display()),
                ai_powered: true,
            })
        }
        (Some((_, IdentificationOutcome::Failure(IdentifyFailure::CredentialMissing))), _) => {
            ScanPhase::Failed {
                message: KEY_MISSING_MESSAGE.to_string(),
                remediation: Remediation::ConfigureCredential,
            }
        }
        (Some((_, IdentificationOutcome::Failure(IdentifyFailure::CredentialInvalid))), _) => {
            ScanPhase::Failed {
                message: KEY_INVALID_MESSAGE.to_string(),
                remediation: Remediation::ConfigureCredential,
            }
        }
        (Some((_, IdentificationOutcome::Failure(failure))), true) => ScanPhase::Failed {
            message: failure.to_string(),
            remediation: Remediation::Retry,
        },
        (Some((_, IdentificationOutcome::Failure(failure))), false) => {
            warn!("identification failed, substituting a catalog sample: {failure}");
            settled_from_catalog(catalog)
        }
        (None, _) => settled_from_catalog(catalog),
    }
}

fn settled_from_catalog(catalog: &FallbackCatalog) -> ScanPhase {
    let entry = catalog.pick_random();
    ScanPhase::Settled(ScanResult {
        name: entry.name.to_string(),
        brand: entry.brand.to_string(),
        price: entry.price.to_string(),
        confidence: entry.confidence.to_string(),
        image: ImageRef::CatalogAsset(entry.image),
        ai_powered: false,
    })
}
