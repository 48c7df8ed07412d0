//! Blocking front-end for the asynchronous recognition engine.
//!
//! A call either drives the engine on the calling thread with a short-lived
//! current-thread runtime, or, when the calling thread is already driving a
//! scheduler, on a dedicated worker thread that owns its own runtime. Both
//! paths share one deadline. The engine operation cannot be cancelled; on
//! timeout it is dropped and any late result is discarded.
//!
//! On the direct path the deadline is only enforced at await points. An
//! engine that blocks the polling thread keeps the caller until it returns,
//! and whatever it produced after the deadline is reported as timed out.

use std::cell::Cell;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::bitmap::Bitmap;
use crate::engine::{RecognitionEngine, RecognitionOutcome, RecognitionRequest, RecognitionService};
use crate::hotkey::panic_message;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Longer timeouts are clamped to this
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Extra wait past the deadline before a silent worker counts as hung
pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);

thread_local! {
    static SCHEDULER_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Marks the current thread as driving an async scheduler while alive.
///
/// Hosts that run their own event loop on a thread hold one of these for the
/// duration of the loop so `recognize` never drives a nested runtime there.
pub struct SchedulerGuard {
    _not_send: PhantomData<*const ()>,
}

impl SchedulerGuard {
    pub fn enter() -> Self {
        SCHEDULER_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for SchedulerGuard {
    fn drop(&mut self) {
        SCHEDULER_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Whether the current thread is already driving a scheduler
pub fn scheduler_active() -> bool {
    SCHEDULER_DEPTH.with(Cell::get) > 0 || tokio::runtime::Handle::try_current().is_ok()
}

/// Synchronous OCR over an asynchronous [`RecognitionService`]
#[derive(Clone)]
pub struct OcrBridge {
    service: Arc<dyn RecognitionService>,
    grace: Duration,
}

impl OcrBridge {
    pub fn new(service: Arc<dyn RecognitionService>) -> Self {
        Self {
            service,
            grace: DEFAULT_GRACE,
        }
    }

    /// Bridge over the OS recognition service of the current target
    pub fn platform() -> Self {
        #[cfg(windows)]
        let service: Arc<dyn RecognitionService> = Arc::new(crate::ocr::WindowsOcr);
        #[cfg(not(windows))]
        let service: Arc<dyn RecognitionService> = Arc::new(crate::engine::UnsupportedRecognition);

        Self::new(service)
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn service(&self) -> &dyn RecognitionService {
        self.service.as_ref()
    }

    /// Recognize text in `request`, blocking for at most `timeout` plus the
    /// grace period. `timeout` is clamped to [`MAX_TIMEOUT`].
    pub fn recognize(&self, request: RecognitionRequest, timeout: Duration) -> RecognitionOutcome {
        let timeout = timeout.min(MAX_TIMEOUT);
        let deadline = Instant::now() + timeout;
        let RecognitionRequest { bitmap, language } = request;

        if !self.service.is_language_supported(&language) {
            tracing::warn!("OCR language pack not installed: {}", language);
            return RecognitionOutcome::LanguagePackMissing(language);
        }

        let Some(engine) = self.service.create_for_language(&language) else {
            tracing::warn!("OCR engine unavailable for {}", language);
            return RecognitionOutcome::EngineUnavailable;
        };

        let outcome = if scheduler_active() {
            tracing::debug!("Scheduler active on caller, recognizing on a worker thread");
            run_on_worker(engine, bitmap, deadline, self.grace)
        } else {
            drive(engine.as_ref(), &bitmap, deadline)
        };

        if outcome == RecognitionOutcome::TimedOut {
            tracing::warn!("OCR timed out after {:?}", timeout);
        }
        outcome
    }
}

/// Run the engine to completion or the deadline on the current thread
fn drive(engine: &dyn RecognitionEngine, bitmap: &Bitmap, deadline: Instant) -> RecognitionOutcome {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return RecognitionOutcome::Failed(format!("failed to start OCR runtime: {e}")),
    };

    let _scheduler = SchedulerGuard::enter();
    let remaining = deadline.saturating_duration_since(Instant::now());
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        runtime.block_on(async { tokio::time::timeout(remaining, engine.recognize(bitmap)).await })
    }));

    if matches!(result, Ok(Ok(_))) && Instant::now() > deadline {
        tracing::warn!("OCR engine returned after its deadline, discarding the result");
        return RecognitionOutcome::TimedOut;
    }

    match result {
        Ok(Ok(Ok(page))) => RecognitionOutcome::Text(page.normalized_lines()),
        Ok(Ok(Err(e))) => RecognitionOutcome::Failed(e.to_string()),
        Ok(Err(_elapsed)) => RecognitionOutcome::TimedOut,
        Err(panic) => RecognitionOutcome::Failed(format!(
            "recognition panicked: {}",
            panic_message(panic.as_ref())
        )),
    }
}

/// Drive the engine on a fresh thread and wait for it without ever joining
fn run_on_worker(
    engine: Box<dyn RecognitionEngine>,
    bitmap: Bitmap,
    deadline: Instant,
    grace: Duration,
) -> RecognitionOutcome {
    let (tx, rx) = kanal::bounded::<RecognitionOutcome>(1);

    let spawned = thread::Builder::new()
        .name("ocr-worker".to_string())
        .spawn(move || {
            let outcome = drive(engine.as_ref(), &bitmap, deadline);
            if tx.send(outcome).is_err() {
                tracing::debug!("OCR caller stopped waiting, discarding late outcome");
            }
        });

    if let Err(e) = spawned {
        return RecognitionOutcome::Failed(format!("failed to spawn OCR worker: {e}"));
    }

    let wait = deadline
        .saturating_duration_since(Instant::now())
        .saturating_add(grace);
    match rx.recv_timeout(wait) {
        Ok(outcome) => outcome,
        Err(kanal::ReceiveErrorTimeout::Timeout) => {
            tracing::error!(
                "OCR worker still running {:?} past its deadline, abandoning it",
                grace
            );
            RecognitionOutcome::Failed("recognition worker unresponsive past deadline".to_string())
        }
        Err(_) => RecognitionOutcome::Failed(
            "recognition worker exited without reporting a result".to_string(),
        ),
    }
}
